use crate::{
    assets::{data_url::DataUrl, decode::image_dimensions},
    foundation::error::{ShelfError, ShelfResult},
};

/// Target size used when neither the body nor the background header gives one.
pub const DEFAULT_TARGET_DIM: u32 = 512;

/// JSON body of `POST /api/generate-camera`.
///
/// Every field is optional on the wire so that missing values become a validation
/// error instead of a parse failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCameraBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_height: Option<u32>,
}

/// One cell's worth of work for a [`crate::CellGenerator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub background: DataUrl,
    pub subject_label: String,
    pub orientation_label: String,
    pub material_label: String,
    pub target_width: u32,
    pub target_height: u32,
}

impl GenerationRequest {
    /// Validate a wire body.
    ///
    /// The four labels and the background are required and must not be blank. Missing
    /// dimensions fall back to the background's own size, then to [`DEFAULT_TARGET_DIM`].
    pub fn from_body(body: GenerateCameraBody) -> ShelfResult<Self> {
        let background = required(body.background_data_url, "backgroundDataUrl")?;
        let subject_label = required(body.camera_name, "cameraName")?;
        let orientation_label = required(body.orientation, "orientation")?;
        let material_label = required(body.material, "material")?;

        let background = DataUrl::parse(&background)
            .map_err(|e| ShelfError::validation(format!("backgroundDataUrl: {e}")))?;

        let native = image_dimensions(background.bytes());
        let target_width = dimension(body.cell_width, native.map(|d| d.0), "cellWidth")?;
        let target_height = dimension(body.cell_height, native.map(|d| d.1), "cellHeight")?;

        Ok(Self {
            background,
            subject_label,
            orientation_label,
            material_label,
            target_width,
            target_height,
        })
    }

    pub fn to_body(&self) -> GenerateCameraBody {
        GenerateCameraBody {
            background_data_url: Some(self.background.to_string()),
            camera_name: Some(self.subject_label.clone()),
            orientation: Some(self.orientation_label.clone()),
            material: Some(self.material_label.clone()),
            cell_width: Some(self.target_width),
            cell_height: Some(self.target_height),
        }
    }
}

fn required(value: Option<String>, field: &str) -> ShelfResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ShelfError::validation(format!("Missing required fields: {field}"))),
    }
}

fn dimension(explicit: Option<u32>, native: Option<u32>, field: &str) -> ShelfResult<u32> {
    match explicit {
        Some(0) => Err(ShelfError::validation(format!("{field} must be > 0"))),
        Some(v) => Ok(v),
        None => Ok(native.filter(|v| *v > 0).unwrap_or(DEFAULT_TARGET_DIM)),
    }
}

/// How a cell image was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Mode {
    #[serde(rename = "openai")]
    Generated,
    #[serde(rename = "fallback")]
    Fallback,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generated => "openai",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful generation. Serializes as the `200` response body.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenerationResult {
    #[serde(rename = "imageDataUrl")]
    pub image: DataUrl,
    pub mode: Mode,
}

/// Error response body: `{"error": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
