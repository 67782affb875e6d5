//! core::stream
//!
//! A pulse per revision change, or a heartbeat when nothing changed.
//!
//! Status and telemetry consumers subscribe to the document without
//! polling it themselves. The stream is driven by
//! [`ChangeNotifier::wait_for_revision`] with the heartbeat as timeout, so
//! it is lazy: nothing runs unless the consumer polls it, and dropping the
//! stream cancels any wait in flight.

use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;

use crate::core::error::CoordError;
use crate::core::notify::ChangeNotifier;
use crate::core::types::{Revision, UtcTimestamp};

/// Why a pulse was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseKind {
    /// The revision advanced.
    Changed,
    /// The heartbeat interval passed without a change.
    Heartbeat,
}

/// One element of a revision stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pulse {
    /// Revision observed when the pulse was emitted.
    pub revision: Revision,
    /// Change or heartbeat.
    pub kind: PulseKind,
    /// Emission time.
    pub at: UtcTimestamp,
}

/// Generator of [`Pulse`]s starting after a given revision.
#[derive(Debug, Clone)]
pub struct RevisionStream {
    notifier: ChangeNotifier,
    since: Revision,
    heartbeat: Duration,
}

impl RevisionStream {
    /// Stream pulses for revisions after `since`, with a heartbeat at least
    /// every `heartbeat` while idle.
    pub fn new(notifier: ChangeNotifier, since: Revision, heartbeat: Duration) -> Self {
        Self {
            notifier,
            since,
            heartbeat,
        }
    }

    /// The last revision this stream has reported past.
    pub fn since(&self) -> Revision {
        self.since
    }

    /// Wait for the next pulse.
    ///
    /// Several revisions committed between calls collapse into one
    /// `Changed` pulse carrying the latest revision.
    pub async fn next_pulse(&mut self) -> Result<Pulse, CoordError> {
        let seen = self
            .notifier
            .wait_for_revision(self.since, self.heartbeat)
            .await?;

        let kind = if seen > self.since {
            self.since = seen;
            PulseKind::Changed
        } else {
            PulseKind::Heartbeat
        };

        Ok(Pulse {
            revision: seen,
            kind,
            at: UtcTimestamp::now(),
        })
    }

    /// Turn into a `Stream`. The first error is yielded and ends the stream.
    pub fn into_stream(self) -> BoxStream<'static, Result<Pulse, CoordError>> {
        stream::unfold(Some(self), |state| async move {
            let mut this = state?;
            match this.next_pulse().await {
                Ok(pulse) => Some((Ok(pulse), Some(this))),
                Err(err) => Some((Err(err), None)),
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::DocumentStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn idle_stream_emits_heartbeats() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::open(temp.path().join("state.json"));
        let since = store.load().unwrap().revision;

        let stream = RevisionStream::new(ChangeNotifier::new(store), since, Duration::from_millis(20));
        let pulses: Vec<_> = stream.into_stream().take(2).collect().await;

        assert_eq!(pulses.len(), 2);
        for pulse in pulses {
            let pulse = pulse.unwrap();
            assert_eq!(pulse.kind, PulseKind::Heartbeat);
            assert_eq!(pulse.revision, since);
        }
    }

    #[tokio::test]
    async fn change_then_heartbeat() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::open(temp.path().join("state.json"));
        let snapshot = store.load().unwrap();
        store.update(snapshot.revision, |doc| doc).unwrap();

        let mut stream = RevisionStream::new(
            ChangeNotifier::new(store),
            snapshot.revision,
            Duration::from_millis(20),
        );

        let first = stream.next_pulse().await.unwrap();
        assert_eq!(first.kind, PulseKind::Changed);
        assert_eq!(first.revision, Revision::new(1));
        assert_eq!(stream.since(), Revision::new(1));

        let second = stream.next_pulse().await.unwrap();
        assert_eq!(second.kind, PulseKind::Heartbeat);
    }

    #[tokio::test]
    async fn storage_error_ends_stream() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::open(temp.path().join("state.json"));
        std::fs::write(store.paths().state_file(), "garbage").unwrap();

        let stream = RevisionStream::new(
            ChangeNotifier::new(store),
            Revision::ZERO,
            Duration::from_millis(20),
        );
        let items: Vec<_> = stream.into_stream().collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[test]
    fn pulse_kind_serializes_snake_case() {
        let json = serde_json::to_string(&PulseKind::Heartbeat).unwrap();
        assert_eq!(json, "\"heartbeat\"");
    }
}
