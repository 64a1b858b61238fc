use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::{
    Client,
    multipart::{Form, Part},
};

use crate::{
    assets::data_url::MIME_PNG,
    foundation::error::{ShelfError, ShelfResult},
};

/// Largest edge the image-edit capability accepts.
pub const MAX_EDIT_DIM: u32 = 1024;

/// File name attached to the uploaded background.
pub const BACKGROUND_FILE_NAME: &str = "cell-background.png";

/// One image-edit call: background bytes plus instruction and output size.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageEdit {
    pub background: Vec<u8>,
    pub prompt: String,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for ImageEdit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageEdit")
            .field("background_len", &self.background.len())
            .field("prompt", &self.prompt)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl ImageEdit {
    /// `width` and `height` are clamped to [`MAX_EDIT_DIM`].
    pub fn new(background: Vec<u8>, prompt: String, width: u32, height: u32) -> Self {
        Self {
            background,
            prompt,
            width: width.min(MAX_EDIT_DIM),
            height: height.min(MAX_EDIT_DIM),
        }
    }

    pub fn size_param(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// External image generation: background + instruction in, encoded image bytes out.
///
/// The capability is untrusted; every failure is reported as a [`ShelfError`].
pub trait ImageCapability {
    fn edit(&self, edit: &ImageEdit) -> ShelfResult<Vec<u8>>;
}

impl<C: ImageCapability + ?Sized> ImageCapability for Box<C> {
    fn edit(&self, edit: &ImageEdit) -> ShelfResult<Vec<u8>> {
        (**self).edit(edit)
    }
}

/// The instruction sent alongside the background crop.
pub fn build_instruction(subject: &str, orientation: &str) -> String {
    [
        "Create a historically accurate vintage camera photograph for a collector grid cell."
            .to_string(),
        format!("Camera model: {subject}."),
        format!(
            "View orientation: strict orthographic {orientation} side view (no perspective skew)."
        ),
        "The camera must sit naturally inside the provided shelf cell background with realistic \
         contact shadows and material-consistent reflections."
            .to_string(),
        "Do not alter the background structure; place only one camera centered in the cell."
            .to_string(),
        "Photorealistic studio quality, high detail, no text, no watermark, no extra objects."
            .to_string(),
    ]
    .join(" ")
}

#[derive(serde::Deserialize)]
struct EditsResponse {
    #[serde(default)]
    data: Vec<EditsDatum>,
}

#[derive(serde::Deserialize)]
struct EditsDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

/// Multipart client for an OpenAI-compatible `/v1/images/edits` endpoint.
#[derive(Clone)]
pub struct OpenAiImageEdits {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for OpenAiImageEdits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiImageEdits")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiImageEdits {
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> ShelfResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShelfError::transport(format!("build http client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/v1/images/edits", endpoint.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ImageCapability for OpenAiImageEdits {
    fn edit(&self, edit: &ImageEdit) -> ShelfResult<Vec<u8>> {
        let image = Part::bytes(edit.background.clone())
            .file_name(BACKGROUND_FILE_NAME)
            .mime_str(MIME_PNG)?;
        let form = Form::new()
            .text("model", self.model.clone())
            .text("prompt", edit.prompt.clone())
            .text("size", edit.size_param())
            .part("image", image);

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let details = resp.text().unwrap_or_default();
            return Err(ShelfError::generation(format!(
                "image capability request failed: {status} {details}"
            )));
        }

        let bytes = resp.bytes()?;
        let payload: EditsResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ShelfError::generation(format!("malformed capability response: {e}")))?;
        let b64 = payload
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ShelfError::generation("image generation did not return image data"))?;

        STANDARD
            .decode(b64.trim())
            .map_err(|e| ShelfError::generation(format!("image payload is not base64: {e}")))
    }
}
