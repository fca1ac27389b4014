//! Connection settings for a Shlink server.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_VERSION: u8 = 2;

/// Where a Shlink instance lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: Url,
    pub api_key: String,
    #[serde(default = "default_api_version")]
    pub api_version: u8,
}

fn default_api_version() -> u8 {
    DEFAULT_API_VERSION
}

impl ServerConfig {
    /// Accepts only absolute `http` or `https` URLs.
    pub fn new(url: &str, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{url}: unsupported scheme `{}`",
                parsed.scheme()
            )));
        }
        Ok(Self {
            url: parsed,
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION,
        })
    }

    pub fn with_api_version(mut self, api_version: u8) -> Self {
        self.api_version = api_version;
        self
    }

    /// Load from `SHLINK_URL`, `SHLINK_API_KEY` and the optional
    /// `SHLINK_API_VERSION`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("SHLINK_URL").ok_or(ConfigError::Missing("SHLINK_URL"))?;
        let api_key = lookup("SHLINK_API_KEY").ok_or(ConfigError::Missing("SHLINK_API_KEY"))?;
        let config = Self::new(&url, api_key)?;
        match lookup("SHLINK_API_VERSION") {
            Some(raw) => {
                let version = raw
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| ConfigError::InvalidVersion(raw.clone()))?;
                Ok(config.with_api_version(version))
            }
            None => Ok(config),
        }
    }

    /// Base URL every API path is resolved against.
    pub fn rest_base(&self) -> String {
        format!(
            "{}/rest/v{}",
            self.url.as_str().trim_end_matches('/'),
            self.api_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn rest_base_appends_version() {
        let config = ServerConfig::new("https://s.test/", "key").unwrap();
        assert_eq!(config.rest_base(), "https://s.test/rest/v2");
        assert_eq!(config.with_api_version(1).rest_base(), "https://s.test/rest/v1");
    }

    #[test]
    fn rest_base_keeps_subpath() {
        let config = ServerConfig::new("https://example.com/shlink", "key").unwrap();
        assert_eq!(config.rest_base(), "https://example.com/shlink/rest/v2");
    }

    #[test]
    fn from_lookup_reads_all_variables() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SHLINK_URL", "https://s.test"),
            ("SHLINK_API_KEY", "secret"),
            ("SHLINK_API_VERSION", "3"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.api_version, 3);
    }

    #[test]
    fn from_lookup_defaults_version() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SHLINK_URL", "https://s.test"),
            ("SHLINK_API_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn from_lookup_reports_missing_key() {
        let err = ServerConfig::from_lookup(lookup(&[("SHLINK_URL", "https://s.test")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SHLINK_API_KEY")));
    }

    #[test]
    fn from_lookup_rejects_bad_values() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("SHLINK_URL", "not a url"),
            ("SHLINK_API_KEY", "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)));

        let err = ServerConfig::from_lookup(lookup(&[
            ("SHLINK_URL", "https://s.test"),
            ("SHLINK_API_KEY", "secret"),
            ("SHLINK_API_VERSION", "two"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVersion(ref v) if v == "two"));
    }

    #[test]
    fn new_rejects_non_http_schemes() {
        let err = ServerConfig::new("localhost:8080", "key").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(ref msg) if msg.contains("`localhost`")));

        let err = ServerConfig::new("ftp://s.test", "key").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)));

        assert!(ServerConfig::new("http://localhost:8080", "key").is_ok());
    }

    #[test]
    fn deserializes_with_default_version() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"url":"https://s.test","api_key":"k"}"#).unwrap();
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }
}
