//! Session configuration.
//!
//! Loaded from a TOML file; every field is optional and falls back to the
//! defaults below. Timeouts are written either as milliseconds or as the
//! string `"infinite"`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::signal::Timeout;

pub const DEFAULT_CLIENT_APPLICATION_ID: &str = "waffle";
pub const DEFAULT_CRITERIA: &str = "IsInstalled=0 and Type='Software' and IsHidden=0";
pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 3 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Identifies this client to the update service.
    pub client_application_id: String,

    /// Search criteria used when none is given on the command line.
    pub criteria: String,

    pub search_timeout: Timeout,
    pub download_timeout: Timeout,
    pub install_timeout: Timeout,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            client_application_id: DEFAULT_CLIENT_APPLICATION_ID.to_string(),
            criteria: DEFAULT_CRITERIA.to_string(),
            search_timeout: Timeout::from_millis(DEFAULT_SEARCH_TIMEOUT_MS),
            download_timeout: Timeout::Infinite,
            install_timeout: Timeout::Infinite,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SessionConfig::from_toml_str("").expect("empty config should parse");
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.search_timeout, Timeout::from_millis(180_000));
        assert_eq!(config.install_timeout, Timeout::Infinite);
    }

    #[test]
    fn test_partial_config_overrides_fields() {
        let config = SessionConfig::from_toml_str(
            r#"
            client_application_id = "nightly-patcher"
            search_timeout = 5000
            download_timeout = "infinite"
            install_timeout = 600000
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.client_application_id, "nightly-patcher");
        assert_eq!(config.criteria, DEFAULT_CRITERIA);
        assert_eq!(config.search_timeout, Timeout::from_millis(5000));
        assert_eq!(config.download_timeout, Timeout::Infinite);
        assert_eq!(config.install_timeout, Timeout::from_millis(600_000));
    }

    #[test]
    fn test_rejects_bad_timeout_keyword() {
        let result = SessionConfig::from_toml_str(r#"search_timeout = "forever""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("waffle.toml");
        fs::write(&path, "criteria = \"IsInstalled=0\"\n").expect("Failed to write config");

        let config = SessionConfig::load(&path).expect("Failed to load config");
        assert_eq!(config.criteria, "IsInstalled=0");
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing.toml");

        assert!(matches!(
            SessionConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));
        let config = SessionConfig::load_or_default(&path).expect("defaults expected");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = SessionConfig {
            download_timeout: Timeout::from_millis(42),
            ..SessionConfig::default()
        };
        let text = toml::to_string(&config).expect("serialize failed");
        assert!(text.contains("install_timeout = \"infinite\""));
        let parsed = SessionConfig::from_toml_str(&text).expect("parse failed");
        assert_eq!(parsed, config);
    }
}
