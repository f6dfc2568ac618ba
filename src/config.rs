//! Configuration management for Parlance
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ParlanceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Main configuration structure for Parlance
///
/// This structure holds all configuration needed by the client,
/// including the backend endpoint and terminal rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend service configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Terminal rendering configuration
    #[serde(default)]
    pub ui: UiConfig,
}

/// Backend service configuration
///
/// Specifies where the remote conversation service lives and how long
/// the HTTP client waits for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the conversation service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Client-level request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Terminal rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Character budget for conversation titles in list rendering
    ///
    /// Titles longer than this are truncated with an ellipsis for display
    /// only; the stored title is never mutated.
    #[serde(default = "default_title_width")]
    pub title_width: usize,
}

fn default_title_width() -> usize {
    32
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title_width: default_title_width(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ParlanceError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ParlanceError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("PARLANCE_BACKEND_URL") {
            self.backend.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("PARLANCE_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid PARLANCE_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(width) = std::env::var("PARLANCE_TITLE_WIDTH") {
            if let Ok(value) = width.parse() {
                self.ui.title_width = value;
            } else {
                tracing::warn!("Invalid PARLANCE_TITLE_WIDTH: {}", width);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(backend_url) = &cli.backend_url {
            self.backend.base_url = backend_url.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// Ensures the backend URL parses, uses a supported scheme, and that
    /// numeric settings are within acceptable ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ParlanceError::Config`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.backend.base_url).map_err(|e| {
            ParlanceError::Config(format!(
                "Invalid backend.base_url '{}': {}",
                self.backend.base_url, e
            ))
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ParlanceError::Config(format!(
                "backend.base_url must be http or https, got '{}'",
                parsed.scheme()
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(
                ParlanceError::Config("backend.timeout_seconds must be positive".to_string())
                    .into(),
            );
        }

        if self.ui.title_width < 4 {
            return Err(ParlanceError::Config(format!(
                "ui.title_width must be at least 4, got {}",
                self.ui.title_width
            ))
            .into());
        }

        Ok(())
    }

    /// Backend base URL with any trailing slash removed
    ///
    /// Endpoint paths are joined with a leading slash, so a trailing slash
    /// here would produce `//list_chats`.
    pub fn backend_base(&self) -> String {
        self.backend.base_url.trim_end_matches('/').to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli_with_defaults() -> crate::cli::Cli {
        crate::cli::Cli {
            config: None,
            backend_url: None,
            verbose: false,
            command: crate::cli::Commands::Chats { json: false },
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.timeout_seconds, 60);
        assert_eq!(config.ui.title_width, 32);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cli = cli_with_defaults();
        let config = Config::load("/nonexistent/parlance.yaml", &cli).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "backend:\n  base_url: https://chat.example.com\n  timeout_seconds: 15\nui:\n  title_width: 20"
        )
        .unwrap();

        let cli = cli_with_defaults();
        let config = Config::load(file.path().to_str().unwrap(), &cli).unwrap();
        assert_eq!(config.backend.base_url, "https://chat.example.com");
        assert_eq!(config.backend.timeout_seconds, 15);
        assert_eq!(config.ui.title_width, 20);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend:\n  base_url: http://127.0.0.1:9000").unwrap();

        let cli = cli_with_defaults();
        let config = Config::load(file.path().to_str().unwrap(), &cli).unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.backend.timeout_seconds, 60);
        assert_eq!(config.ui.title_width, 32);
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend: [not, a, mapping").unwrap();

        let cli = cli_with_defaults();
        assert!(Config::load(file.path().to_str().unwrap(), &cli).is_err());
    }

    #[test]
    fn test_cli_override_wins() {
        let mut cli = cli_with_defaults();
        cli.backend_url = Some("http://10.0.0.5:8000".to_string());
        let config = Config::load("/nonexistent/parlance.yaml", &cli).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.5:8000");
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.backend.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut config = Config::default();
        config.backend.base_url = "ftp://chat.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_tiny_title_width() {
        let mut config = Config::default();
        config.ui.title_width = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_base_strips_trailing_slash() {
        let mut config = Config::default();
        config.backend.base_url = "http://localhost:8000/".to_string();
        assert_eq!(config.backend_base(), "http://localhost:8000");
    }
}
