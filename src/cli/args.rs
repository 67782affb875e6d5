//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--state <path>`: State document to operate on
//! - `--config <path>`: Config file to load
//! - `--debug`: Enable debug logging
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ags - Shared state, locks and change notification for cooperating agents
#[derive(Parser, Debug)]
#[command(name = "ags")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// State document path (overrides config and AGS_STATE_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Config file path (overrides AGS_CONFIG and default locations)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Panic switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show revision, panic flag, lock count and collections
    Status,

    /// Turn the global lock-acquisition emergency stop on or off
    #[command(
        after_help = "\
EXAMPLES:
    # Stop all new lock grants immediately
    ags panic on

    # Resume normal operation
    ags panic off"
    )]
    Panic {
        /// New switch position
        #[arg(value_enum)]
        switch: Switch,
    },

    /// List locks currently in force
    Locks,

    /// Acquire locks on one or more resources (all or nothing)
    #[command(
        after_help = "\
EXAMPLES:
    # Lock two resources for a minute
    ags acquire repo/main ci --owner alice --ttl-ms 60000"
    )]
    Acquire {
        /// Resources to lock
        #[arg(required = true)]
        resources: Vec<String>,

        /// Lock owner identity
        #[arg(long)]
        owner: String,

        /// Lock lifetime in milliseconds (default from config)
        #[arg(long)]
        ttl_ms: Option<u64>,
    },

    /// Release locks held by an owner
    Release {
        /// Resources to release
        #[arg(required = true)]
        resources: Vec<String>,

        /// Lock owner identity
        #[arg(long)]
        owner: String,
    },

    /// Prune expired lock entries
    Reap,

    /// Block until the revision passes a value or the timeout elapses
    Wait {
        /// Revision to wait past (default: current)
        #[arg(long)]
        since: Option<u64>,

        /// Max wait in milliseconds
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
    },

    /// Print a pulse per revision change, with idle heartbeats
    Watch {
        /// Revision to start after (default: current)
        #[arg(long)]
        since: Option<u64>,

        /// Heartbeat interval in milliseconds (default from config)
        #[arg(long)]
        heartbeat_ms: Option<u64>,

        /// Stop after this many pulses
        #[arg(long)]
        count: Option<usize>,
    },

    /// Print one domain collection as JSON
    Get {
        /// Collection name (e.g. tasks, messages)
        collection: String,
    },
}
