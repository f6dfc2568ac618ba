//! Error types for Parlance
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Parlance operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, credential handling, backend requests, and
/// session state operations.
#[derive(Error, Debug)]
pub enum ParlanceError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend answered with a non-2xx status
    ///
    /// Carries the HTTP status code and the raw response body so callers
    /// can extract the backend's `detail` message where one exists.
    #[error("Backend rejected request: status={status}, {body}")]
    Backend {
        /// HTTP status code of the response
        status: u16,
        /// Raw response body (often a `{"detail": ...}` JSON object)
        body: String,
    },

    /// A protected operation was attempted without a stored credential
    #[error("Not signed in: {0}")]
    AuthRequired(String),

    /// Session state errors (unbound conversation, torn-down context)
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors (connect failures, DNS, malformed responses)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl ParlanceError {
    /// Extract the backend's `detail` message from a [`ParlanceError::Backend`]
    ///
    /// The backend reports failures for login and signup as a JSON object
    /// with a `detail` field. When the body is not JSON, or the variant is
    /// not `Backend`, this returns `None` and callers fall back to a
    /// generic message.
    pub fn backend_detail(&self) -> Option<String> {
        match self {
            Self::Backend { body, .. } => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from)),
            _ => None,
        }
    }

    /// Returns true for transport-level failures where no response arrived
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Result type alias for Parlance operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
