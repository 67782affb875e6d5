//! wait and watch commands - Long-poll and stream revision changes

use std::time::Duration;

use anyhow::{Context as _, Result};
use futures::StreamExt;
use serde_json::json;

use super::emit;
use crate::cli::Context;
use crate::core::notify::ChangeNotifier;
use crate::core::stream::{PulseKind, RevisionStream};
use crate::core::types::Revision;

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn starting_revision(ctx: &Context, since: Option<u64>) -> Result<Revision> {
    match since {
        Some(rev) => Ok(Revision::new(rev)),
        None => Ok(ctx.store.load().context("Failed to load state")?.revision),
    }
}

/// Block until the revision passes `since` or `timeout_ms` elapses.
pub fn wait(ctx: &Context, since: Option<u64>, timeout_ms: u64) -> Result<()> {
    let since = starting_revision(ctx, since)?;
    let notifier = ChangeNotifier::new(ctx.store.clone());

    let rt = runtime()?;
    let seen = rt
        .block_on(notifier.wait_for_revision(since, Duration::from_millis(timeout_ms)))
        .context("Failed while waiting for a revision")?;
    let changed = seen > since;

    emit(
        ctx,
        &json!({ "revision": seen, "changed": changed }),
        || {
            if changed {
                format!("revision {}", seen)
            } else {
                format!("revision {} (timed out)", seen)
            }
        },
    )
}

/// Print pulses until `count` is reached (or forever).
pub fn watch(
    ctx: &Context,
    since: Option<u64>,
    heartbeat_ms: Option<u64>,
    count: Option<usize>,
) -> Result<()> {
    let since = starting_revision(ctx, since)?;
    let heartbeat = heartbeat_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| ctx.config.heartbeat());
    let notifier = ChangeNotifier::new(ctx.store.clone());
    let pulses = RevisionStream::new(notifier, since, heartbeat).into_stream();

    let rt = runtime()?;
    rt.block_on(async {
        let mut pulses = match count {
            Some(n) => pulses.take(n).boxed(),
            None => pulses,
        };
        while let Some(pulse) = pulses.next().await {
            let pulse = pulse.context("Revision stream failed")?;
            emit(ctx, &pulse, || {
                let kind = match pulse.kind {
                    PulseKind::Changed => "changed",
                    PulseKind::Heartbeat => "heartbeat",
                };
                format!("{} {} {}", pulse.at, kind, pulse.revision)
            })?;
        }
        Ok::<(), anyhow::Error>(())
    })
}
