//! Parlance - terminal chat client
//!
//! Main entry point for the Parlance application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parlance::cli::{Cli, Commands};
use parlance::commands;
use parlance::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Login { email } => {
            tracing::info!("Starting login");
            commands::auth::run_login(config, email).await?;
            Ok(())
        }
        Commands::Signup { email } => {
            tracing::info!("Starting signup");
            commands::auth::run_signup(config, email).await?;
            Ok(())
        }
        Commands::Signout => {
            tracing::info!("Starting signout");
            commands::auth::run_signout(config).await?;
            Ok(())
        }
        Commands::Chats { json } => {
            tracing::info!("Listing conversations");
            commands::chats::run_chats(config, json).await?;
            Ok(())
        }
        Commands::Chat { open } => {
            tracing::info!("Starting interactive chat session");
            if let Some(id) = &open {
                tracing::debug!("Opening conversation immediately: {}", id);
            }
            commands::chat::run_chat(config, open).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parlance=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
