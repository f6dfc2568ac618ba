//! Command-line interface definition for Parlance
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for authentication, conversation listing, and
//! the interactive chat session.

use clap::{Parser, Subcommand};

/// Parlance - terminal chat client
///
/// Talk to a remote conversation service: sign in, browse your
/// conversations, and exchange messages with the assistant.
#[derive(Parser, Debug, Clone)]
#[command(name = "parlance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the backend base URL from config
    #[arg(short, long)]
    pub backend_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Parlance
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in and store the session credential
    Login {
        /// Email address (prompted for when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account
    Signup {
        /// Email address (prompted for when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Sign out and discard the stored credential
    Signout,

    /// List conversations
    Chats {
        /// Output the conversation list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// Conversation id to open immediately
        #[arg(short = 'o', long)]
        open: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
