//! panic command - Flip the lock-acquisition emergency stop

use anyhow::{Context as _, Result};
use serde_json::json;

use super::emit;
use crate::cli::args::Switch;
use crate::cli::Context;
use crate::core::locks::LockManager;

/// Set the panic flag on or off.
pub fn panic(ctx: &Context, switch: Switch) -> Result<()> {
    let enabled = switch == Switch::On;
    let locks = LockManager::new(ctx.store.clone());
    let previous = locks
        .set_panic_mode(enabled)
        .context("Failed to update panic mode")?;

    emit(
        ctx,
        &json!({ "panic_mode": enabled, "previous": previous }),
        || match (previous, enabled) {
            (true, true) => "Panic mode already on.".to_string(),
            (false, false) => "Panic mode already off.".to_string(),
            (_, true) => "Panic mode ON: new lock acquisitions are rejected.".to_string(),
            (_, false) => "Panic mode off.".to_string(),
        },
    )
}
