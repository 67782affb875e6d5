//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Resolve configuration and open the store
//! - Delegate to command handlers
//!
//! The CLI never touches the state file directly; every read and write goes
//! through [`crate::core`].

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::core::store::DocumentStore;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "AGS_LOG";

/// Execution context shared by command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved configuration.
    pub config: Config,
    /// Store opened from `config`.
    pub store: DocumentStore,
    /// Emit JSON instead of text.
    pub json: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(state) = &cli.state {
        config = config.with_state_path(state);
    }
    tracing::debug!(state = %config.state_path().display(), "resolved state path");

    let ctx = Context {
        store: DocumentStore::from_config(&config),
        config,
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("agentstate=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
