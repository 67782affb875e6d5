//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the state engine
//! 3. Formats and displays output (text, or JSON with `--json`)
//!
//! # Async Commands
//!
//! `wait` and `watch` drive the async notifier, so their handlers build a
//! tokio runtime and block on it.

mod get;
mod lock_cmd;
mod panic_cmd;
mod status;
mod wait;

pub use get::get;
pub use lock_cmd::{acquire, locks, reap, release};
pub use panic_cmd::panic;
pub use status::status;
pub use wait::{wait, watch};

use anyhow::Result;
use serde::Serialize;

use crate::cli::args::Command;
use crate::cli::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Status => status::status(ctx),
        Command::Panic { switch } => panic_cmd::panic(ctx, switch),
        Command::Locks => lock_cmd::locks(ctx),
        Command::Acquire {
            resources,
            owner,
            ttl_ms,
        } => lock_cmd::acquire(ctx, &resources, &owner, ttl_ms),
        Command::Release { resources, owner } => lock_cmd::release(ctx, &resources, &owner),
        Command::Reap => lock_cmd::reap(ctx),
        Command::Wait { since, timeout_ms } => wait::wait(ctx, since, timeout_ms),
        Command::Watch {
            since,
            heartbeat_ms,
            count,
        } => wait::watch(ctx, since, heartbeat_ms, count),
        Command::Get { collection } => get::get(ctx, &collection),
    }
}

/// Print `value` as JSON, or the text rendering otherwise.
pub(crate) fn emit<T: Serialize>(ctx: &Context, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
