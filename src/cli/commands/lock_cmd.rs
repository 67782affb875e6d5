//! lock commands - List, acquire, release and reap resource locks

use std::time::Duration;

use anyhow::{Context as _, Result};
use serde_json::json;

use super::emit;
use crate::cli::Context;
use crate::core::locks::LockManager;
use crate::core::types::LockEntry;

fn render(entries: &[LockEntry]) -> String {
    if entries.is_empty() {
        return "No locks.".to_string();
    }
    entries
        .iter()
        .map(|e| format!("{}  owner={}  expires={}", e.resource_id, e.owner, e.expires_at))
        .collect::<Vec<_>>()
        .join("\n")
}

/// List locks currently in force.
pub fn locks(ctx: &Context) -> Result<()> {
    let manager = LockManager::new(ctx.store.clone());
    let active = manager.active_locks().context("Failed to read locks")?;
    emit(ctx, &active, || render(&active))
}

/// Acquire locks for `owner`.
pub fn acquire(ctx: &Context, resources: &[String], owner: &str, ttl_ms: Option<u64>) -> Result<()> {
    let ttl = ttl_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| ctx.config.default_lock_ttl());

    let manager = LockManager::new(ctx.store.clone());
    let granted = manager
        .acquire(resources.iter().cloned(), owner, ttl)
        .with_context(|| format!("Failed to acquire locks for '{}'", owner))?;

    emit(ctx, &granted, || render(&granted))
}

/// Release locks held by `owner`.
pub fn release(ctx: &Context, resources: &[String], owner: &str) -> Result<()> {
    let manager = LockManager::new(ctx.store.clone());
    let released = manager
        .release(resources.iter().cloned(), owner)
        .with_context(|| format!("Failed to release locks for '{}'", owner))?;

    emit(ctx, &json!({ "released": released }), || {
        if released.is_empty() {
            "Nothing to release.".to_string()
        } else {
            format!("Released: {}", released.join(", "))
        }
    })
}

/// Prune expired lock entries.
pub fn reap(ctx: &Context) -> Result<()> {
    let manager = LockManager::new(ctx.store.clone());
    let reaped = manager.reap_expired().context("Failed to reap locks")?;
    emit(ctx, &reaped, || format!("Reaped {} expired lock(s).", reaped.len()))
}
