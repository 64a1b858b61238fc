use std::time::Duration;

use reqwest::blocking::Client;

use crate::{
    foundation::error::{ShelfError, ShelfResult},
    generate::request::{ErrorBody, GenerationRequest, GenerationResult},
};

/// Route served by the generation adapter.
pub const GENERATE_PATH: &str = "/api/generate-camera";

/// Produces one foreground image per cell.
///
/// Implementations are called sequentially, once per cell, and never retried.
pub trait CellGenerator {
    fn generate(&self, request: &GenerationRequest) -> ShelfResult<GenerationResult>;
}

impl<G: CellGenerator + ?Sized> CellGenerator for &G {
    fn generate(&self, request: &GenerationRequest) -> ShelfResult<GenerationResult> {
        (**self).generate(request)
    }
}

impl<G: CellGenerator + ?Sized> CellGenerator for Box<G> {
    fn generate(&self, request: &GenerationRequest) -> ShelfResult<GenerationResult> {
        (**self).generate(request)
    }
}

/// Calls a remote adapter over HTTP.
#[derive(Clone, Debug)]
pub struct HttpGenerator {
    client: Client,
    endpoint: String,
}

impl HttpGenerator {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:3000`.
    ///
    /// `None` disables the request timeout entirely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ShelfResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShelfError::transport(format!("build http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}{GENERATE_PATH}", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CellGenerator for HttpGenerator {
    fn generate(&self, request: &GenerationRequest) -> ShelfResult<GenerationResult> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request.to_body())
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(ShelfError::generation(format!(
                "adapter returned {status}: {detail}"
            )));
        }

        let bytes = resp.bytes()?;
        serde_json::from_slice::<GenerationResult>(&bytes)
            .map_err(|e| ShelfError::generation(format!("malformed adapter response: {e}")))
    }
}
