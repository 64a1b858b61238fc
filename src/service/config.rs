use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::foundation::error::ShelfError;

pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PUBLIC_ROOT: &str = "public";

/// What the adapter does when the downstream call times out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    #[default]
    Fail,
    Fallback,
}

impl FromStr for TimeoutPolicy {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "fallback" => Ok(Self::Fallback),
            other => Err(ShelfError::validation(format!(
                "unknown timeout policy '{other}' (expected 'fail' or 'fallback')"
            ))),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Bearer credential. `None` puts the adapter in fallback-only mode.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub downstream_timeout: Option<Duration>,
    pub timeout_policy: TimeoutPolicy,
}

impl std::fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("downstream_timeout", &self.downstream_timeout)
            .field("timeout_policy", &self.timeout_policy)
            .finish()
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            downstream_timeout: None,
            timeout_policy: TimeoutPolicy::Fail,
        }
    }
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty());
        let endpoint = lookup("SHELFGRID_IMAGE_ENDPOINT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_ENDPOINT.to_string());
        let model = lookup("SHELFGRID_IMAGE_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());
        let downstream_timeout = lookup("SHELFGRID_DOWNSTREAM_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis);
        let timeout_policy = lookup("SHELFGRID_TIMEOUT_POLICY")
            .and_then(|v| v.parse::<TimeoutPolicy>().ok())
            .unwrap_or_default();

        Self {
            api_key,
            endpoint,
            model,
            downstream_timeout,
            timeout_policy,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub public_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            public_root: PathBuf::from(DEFAULT_PUBLIC_ROOT),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let public_root = lookup("SHELFGRID_PUBLIC_ROOT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_ROOT));
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], port)),
            public_root,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn adapter_defaults_when_unset() {
        let cfg = AdapterConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, AdapterConfig::default());
        assert!(!cfg.has_credential());
    }

    #[test]
    fn adapter_reads_overrides() {
        let cfg = AdapterConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("SHELFGRID_IMAGE_ENDPOINT", "http://127.0.0.1:9999"),
            ("SHELFGRID_DOWNSTREAM_TIMEOUT_MS", "1500"),
            ("SHELFGRID_TIMEOUT_POLICY", "Fallback"),
        ]));
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.endpoint, "http://127.0.0.1:9999");
        assert_eq!(cfg.model, DEFAULT_IMAGE_MODEL);
        assert_eq!(cfg.downstream_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(cfg.timeout_policy, TimeoutPolicy::Fallback);
    }

    #[test]
    fn blank_key_and_zero_timeout_mean_absent() {
        let cfg = AdapterConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "  "),
            ("SHELFGRID_DOWNSTREAM_TIMEOUT_MS", "0"),
        ]));
        assert!(cfg.api_key.is_none());
        assert!(cfg.downstream_timeout.is_none());
    }

    #[test]
    fn debug_redacts_key() {
        let cfg = AdapterConfig {
            api_key: Some("sk-secret".into()),
            ..AdapterConfig::default()
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("sk-secret"));
    }

    #[test]
    fn server_port_and_root() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("SHELFGRID_PUBLIC_ROOT", "/srv/www"),
        ]));
        assert_eq!(cfg.bind.port(), 8080);
        assert_eq!(cfg.public_root, PathBuf::from("/srv/www"));

        let cfg = ServerConfig::from_lookup(lookup(&[("PORT", "nope")]));
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn timeout_policy_parses() {
        assert_eq!("fail".parse::<TimeoutPolicy>().unwrap(), TimeoutPolicy::Fail);
        assert!("sometimes".parse::<TimeoutPolicy>().is_err());
    }
}
