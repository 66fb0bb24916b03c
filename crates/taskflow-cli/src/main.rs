//! taskflow - manage taskflow tasks from the terminal.
//!
//! Signs in against the taskflow REST backend, keeps the session on disk,
//! and exposes task operations as subcommands.

mod cli;
mod commands;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use taskflow_core::auth::FileSessionStore;
use taskflow_core::utils::extract_error_message;
use taskflow_core::{ApiClient, ApiError, Config};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", user_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load().unwrap_or_else(|e| {
        error!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    config.api_url_override = cli.api_url;

    let store = FileSessionStore::in_dir(config.cache_dir()?);
    debug!(path = %store.path().display(), "Using session file");

    let client = ApiClient::new(&config, Box::new(store))?;
    commands::run(cli.command, &client, &mut config).await
}

fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::SessionExpired) => {
            "Your session has expired. Run `taskflow login` to sign in again.".to_string()
        }
        Some(api_error) => extract_error_message(api_error),
        None => format!("{:#}", err),
    }
}
