use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::foundation::error::{ShelfError, ShelfResult};

pub const MIME_PNG: &str = "image/png";
pub const MIME_SVG: &str = "image/svg+xml";

/// An encoded image that names its own format: `data:<mime>;base64,<payload>`.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataUrl")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl DataUrl {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(MIME_PNG, bytes)
    }

    pub fn svg(markup: impl Into<String>) -> Self {
        Self::new(MIME_SVG, markup.into().into_bytes())
    }

    /// Wrap an already base64-encoded payload, checking that it decodes.
    pub fn from_base64(mime: impl Into<String>, payload: &str) -> ShelfResult<Self> {
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ShelfError::decode(format!("invalid base64 payload: {e}")))?;
        Ok(Self::new(mime, bytes))
    }

    pub fn parse(url: &str) -> ShelfResult<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ShelfError::decode("data URL must start with 'data:'"))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| ShelfError::decode("data URL must be base64 encoded"))?;
        if mime.is_empty() || payload.is_empty() {
            return Err(ShelfError::decode("data URL has an empty mime type or payload"));
        }
        Self::from_base64(mime, payload)
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_svg(&self) -> bool {
        self.mime.eq_ignore_ascii_case(MIME_SVG)
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

impl std::str::FromStr for DataUrl {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for DataUrl {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for DataUrl {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let url = DataUrl::svg("<svg/>");
        let text = url.to_string();
        assert!(text.starts_with("data:image/svg+xml;base64,"));
        assert_eq!(DataUrl::parse(&text).unwrap(), url);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(DataUrl::parse("image/png;base64,AAAA").is_err());
        assert!(DataUrl::parse("data:image/png,AAAA").is_err());
        assert!(DataUrl::parse("data:;base64,AAAA").is_err());
        assert!(DataUrl::parse("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn parse_keeps_mime() {
        let url = DataUrl::parse("data:image/jpeg;base64,AAEC").unwrap();
        assert_eq!(url.mime(), "image/jpeg");
        assert_eq!(url.bytes(), &[0, 1, 2]);
        assert!(!url.is_svg());
    }

    #[test]
    fn serde_uses_url_text() {
        let url = DataUrl::png(vec![1, 2, 3]);
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, "\"data:image/png;base64,AQID\"");
        let back: DataUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, url);
    }
}
