//! Parlance - terminal chat client library
//!
//! This library provides the core functionality for the Parlance chat
//! client: credential handling, the backend HTTP contract, and the
//! session state that keeps the local conversation list and transcripts
//! consistent with the remote service.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: Credential persistence and authentication gating
//! - `client`: HTTP client implementing the backend wire contract
//! - `session`: Conversation list store and per-conversation controller
//! - `commands`: CLI command handlers and the interactive session
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use parlance::client::ApiClient;
//! use parlance::config::Config;
//! use parlance::session::SessionContext;
//! use parlance::auth::StoredCredential;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let client = ApiClient::new(&config)?.with_credential("token");
//!     let mut session = SessionContext::establish(StoredCredential::new("token"));
//!     session.ensure_chat_list(&client).await;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use auth::{AuthGate, AuthStatus, CredentialStore, StoredCredential};
pub use client::{ApiClient, ChatMessage, ChatSummary, ChatTranscript};
pub use config::Config;
pub use error::{ParlanceError, Result};
pub use session::{ChatListStore, ChatSessionController, SessionContext};
