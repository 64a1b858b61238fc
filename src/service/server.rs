use std::{
    io::Read as _,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use crate::{
    foundation::error::{ShelfError, ShelfResult},
    generate::{
        client::GENERATE_PATH,
        request::{ErrorBody, GenerateCameraBody},
    },
    service::{adapter::Adapter, config::ServerConfig},
};

/// Request bodies above this size are rejected.
pub const MAX_BODY_BYTES: u64 = 32 * 1024 * 1024;

pub const GENERATION_FAILED: &str = "Failed to generate camera image.";

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// A fully buffered HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: TEXT,
            body: body.as_bytes().to_vec(),
        }
    }

    fn json<T: serde::Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: JSON,
                body,
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response body");
                Self::text(500, GENERATION_FAILED)
            }
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, &ErrorBody::new(message))
    }
}

/// Blocking HTTP front end: the generation route plus static files from `public_root`.
///
/// Requests are handled one at a time on the accept loop.
pub struct Server {
    http: tiny_http::Server,
    adapter: Adapter,
    public_root: PathBuf,
}

impl Server {
    pub fn bind(config: &ServerConfig, adapter: Adapter) -> ShelfResult<Self> {
        let http = tiny_http::Server::http(config.bind)
            .map_err(|e| anyhow::anyhow!("bind http server on {}: {e}", config.bind))?;
        Ok(Self {
            http,
            adapter,
            public_root: config.public_root.clone(),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// Accept and answer requests until the listener shuts down.
    pub fn serve(&self) -> ShelfResult<()> {
        tracing::info!(
            addr = ?self.local_addr(),
            root = %self.public_root.display(),
            online = self.adapter.is_online(),
            "listening"
        );
        for request in self.http.incoming_requests() {
            self.handle(request);
        }
        Ok(())
    }

    fn handle(&self, mut request: tiny_http::Request) {
        let method = request.method().to_string();
        let url = request.url().to_string();

        let mut body = Vec::new();
        let read = request
            .as_reader()
            .take(MAX_BODY_BYTES + 1)
            .read_to_end(&mut body);

        let reply = match read {
            Err(e) => {
                tracing::warn!(error = %e, "failed to read request body");
                Reply::error(400, "Unreadable request body.")
            }
            Ok(n) if n as u64 > MAX_BODY_BYTES => Reply::error(400, "Request body too large."),
            Ok(_) => route(&method, &url, &body, &self.adapter, &self.public_root),
        };
        tracing::debug!(%method, %url, status = reply.status, "handled request");

        let mut response = tiny_http::Response::from_data(reply.body)
            .with_status_code(reply.status);
        if let Ok(header) =
            tiny_http::Header::from_bytes(&b"Content-Type"[..], reply.content_type)
        {
            response = response.with_header(header);
        }
        if let Err(e) = request.respond(response) {
            tracing::warn!(error = %e, "failed to send response");
        }
    }
}

/// Dispatch one request. Pure apart from the adapter call and static file reads.
pub fn route(
    method: &str,
    url: &str,
    body: &[u8],
    adapter: &Adapter,
    public_root: &Path,
) -> Reply {
    let path = url_path(url);
    match method {
        "POST" if path == GENERATE_PATH => generate(body, adapter),
        "GET" => serve_static(public_root, url),
        _ => Reply::text(405, "Method Not Allowed"),
    }
}

fn generate(body: &[u8], adapter: &Adapter) -> Reply {
    let parsed: GenerateCameraBody = match serde_json::from_slice(body) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, "malformed request body");
            return Reply::error(400, "Invalid JSON body.");
        }
    };

    match adapter.handle_body(parsed) {
        Ok(result) => {
            tracing::info!(mode = %result.mode, "generated cell image");
            Reply::json(200, &result)
        }
        Err(ShelfError::Validation(msg)) => Reply::error(400, &msg),
        Err(e) => {
            tracing::error!(error = %e, "camera generation failed");
            Reply::error(500, GENERATION_FAILED)
        }
    }
}

fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or("")
}

/// Where a static request landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StaticTarget {
    File(PathBuf),
    Forbidden,
}

/// Map a request URL onto a file under `root`.
///
/// `/` serves `/index.html` and the query string is ignored. `..` segments are resolved
/// lexically; a path that would climb above `root` is [`StaticTarget::Forbidden`].
pub fn resolve_static(root: &Path, url: &str) -> StaticTarget {
    let path = match url_path(url) {
        "" | "/" => "/index.html",
        p => p,
    };

    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return StaticTarget::Forbidden;
                }
            }
            s if s.contains(['\\', ':']) => return StaticTarget::Forbidden,
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return StaticTarget::Forbidden;
    }

    let mut file = root.to_path_buf();
    file.extend(segments);
    StaticTarget::File(file)
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        _ => TEXT,
    }
}

fn serve_static(root: &Path, url: &str) -> Reply {
    let file = match resolve_static(root, url) {
        StaticTarget::File(f) => f,
        StaticTarget::Forbidden => return Reply::text(403, "Forbidden"),
    };
    tracing::debug!(file = %file.display(), "static lookup");
    match std::fs::read(&file) {
        Ok(body) => Reply {
            status: 200,
            content_type: content_type_for(&file),
            body,
        },
        Err(_) => Reply::text(404, "Not Found"),
    }
}
