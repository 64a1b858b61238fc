/// Convenience result type used across shelfgrid.
pub type ShelfResult<T> = Result<T, ShelfError>;

/// Top-level error taxonomy for layout, rendering and generation.
#[derive(thiserror::Error, Debug)]
pub enum ShelfError {
    /// Malformed or incomplete input (generation requests, grid specs).
    #[error("validation error: {0}")]
    Validation(String),

    /// The generation capability answered with a failure or an unusable payload.
    #[error("generation error: {0}")]
    Generation(String),

    /// The network call itself failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A downstream call exceeded its configured timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Data URL, image or SVG payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Raster allocation or bounds problems.
    #[error("render error: {0}")]
    Render(String),

    /// JSON encode/decode failures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShelfError {
    /// Build a [`ShelfError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ShelfError::Generation`] value.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Build a [`ShelfError::Transport`] value.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Build a [`ShelfError::Timeout`] value.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Build a [`ShelfError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ShelfError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ShelfError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<reqwest::Error> for ShelfError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Generation(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ShelfError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ShelfError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ShelfError::generation("x")
                .to_string()
                .contains("generation error:")
        );
        assert!(
            ShelfError::transport("x")
                .to_string()
                .contains("transport error:")
        );
        assert!(ShelfError::timeout("x").to_string().contains("timeout:"));
        assert!(ShelfError::decode("x").to_string().contains("decode error:"));
        assert!(ShelfError::render("x").to_string().contains("render error:"));
        assert!(
            ShelfError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ShelfError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn json_errors_map_to_serde() {
        let err: ShelfError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, ShelfError::Serde(_)));
    }
}
