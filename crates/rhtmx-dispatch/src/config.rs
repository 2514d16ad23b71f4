// File: src/config.rs
// Purpose: Dispatch configuration parsed from rhtmx-dispatch.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub response: ResponseConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

/// Response defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseConfig {
    /// Status of a fresh response (default: 200)
    #[serde(default = "default_status")]
    pub default_status: u16,

    /// Status set when no operator produces a terminal reply (default: 404)
    #[serde(default = "default_not_found_status")]
    pub not_found_status: u16,

    #[serde(default = "default_content_type")]
    pub content_type: String,
}

/// Query string parsing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryConfig {
    /// Whether `+` decodes to a space (form encoding)
    #[serde(default = "default_true")]
    pub plus_as_space: bool,
}

// Default values
fn default_status() -> u16 {
    200
}

fn default_not_found_status() -> u16 {
    404
}

fn default_content_type() -> String {
    "text/html; charset=utf-8".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            default_status: default_status(),
            not_found_status: default_not_found_status(),
            content_type: default_content_type(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            plus_as_space: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        tracing::debug!(?path, "loaded dispatch config");
        Ok(config)
    }

    /// Load configuration from default path (./rhtmx-dispatch.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("rhtmx-dispatch.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.response.default_status, 200);
        assert_eq!(config.response.not_found_status, 404);
        assert_eq!(config.response.content_type, "text/html; charset=utf-8");
        assert!(config.query.plus_as_space);
    }

    #[test]
    fn test_empty_config() {
        let config = toml::from_str::<Config>("").unwrap_or_default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [response]
            not_found_status = 410

            [query]
            plus_as_space = false
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.response.not_found_status, 410);
        assert_eq!(config.response.default_status, 200);
        assert!(!config.query.plus_as_space);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("does/not/exist.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let path = std::env::temp_dir().join("rhtmx-dispatch-bad-config.toml");
        fs::write(&path, "[response]\nnot_found_status = \"gone\"\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config file"));

        fs::remove_file(&path).ok();
    }
}
