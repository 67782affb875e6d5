//! status command - Summarize the state document

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::emit;
use crate::cli::Context;
use crate::core::types::{Revision, UtcTimestamp};

#[derive(Debug, Serialize)]
struct StatusReport {
    path: String,
    revision: Revision,
    panic_mode: bool,
    active_locks: usize,
    updated_at: Option<UtcTimestamp>,
    collections: Vec<String>,
}

/// Show revision, panic flag, active lock count and collection names.
pub fn status(ctx: &Context) -> Result<()> {
    let snapshot = ctx.store.load().context("Failed to load state")?;
    let doc = &snapshot.document;

    let report = StatusReport {
        path: ctx.store.paths().state_file().display().to_string(),
        revision: snapshot.revision,
        panic_mode: doc.panic_mode,
        active_locks: doc.active_locks(&UtcTimestamp::now()).len(),
        updated_at: doc.updated_at,
        collections: doc.collections.keys().cloned().collect(),
    };

    emit(ctx, &report, || {
        let mut out = format!(
            "state:       {}\nrevision:    {}\npanic mode:  {}\nlocks:       {}",
            report.path,
            report.revision,
            if report.panic_mode { "ON" } else { "off" },
            report.active_locks
        );
        if let Some(at) = &report.updated_at {
            out.push_str(&format!("\nupdated:     {}", at));
        }
        if !report.collections.is_empty() {
            out.push_str(&format!("\ncollections: {}", report.collections.join(", ")));
        }
        out
    })
}
