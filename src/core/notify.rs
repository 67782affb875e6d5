//! core::notify
//!
//! Block until the document revision advances, without busy-waiting.
//!
//! # Architecture
//!
//! Writes made through the same [`DocumentStore`] (or a clone) wake waiters
//! immediately through an in-process `watch` signal. Writes from other
//! handles or processes have no such signal, so every wait cycle also
//! rechecks the durable revision at least once per poll interval. Each
//! cycle is a `select!` of the two, bounded by the caller's deadline.
//!
//! Waiting holds no store lock, and disk probes run on the blocking pool,
//! so waiters never stall writers or other tasks. Dropping the returned
//! future cancels the wait; nothing outlives it.
//!
//! # Example
//!
//! ```no_run
//! use agentstate::core::notify::ChangeNotifier;
//! use agentstate::core::store::DocumentStore;
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), agentstate::core::error::CoordError> {
//! let store = DocumentStore::open("/tmp/agents/state.json");
//! let notifier = ChangeNotifier::new(store.clone());
//!
//! let since = store.load()?.revision;
//! let seen = notifier.wait_for_revision(since, Duration::from_secs(30)).await?;
//! if seen > since {
//!     println!("changed: now at {}", seen);
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::time::Instant;

use crate::core::error::CoordError;
use crate::core::store::DocumentStore;
use crate::core::types::Revision;

/// Long-poll primitive over a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    store: DocumentStore,
    poll_interval: Duration,
}

impl ChangeNotifier {
    /// Create a notifier using the store's configured poll interval.
    pub fn new(store: DocumentStore) -> Self {
        let poll_interval = store.options().poll_interval;
        Self {
            store,
            poll_interval,
        }
    }

    /// Override how often the durable revision is rechecked.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The store being watched.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Read the durable revision off the async executor.
    pub async fn current_revision(&self) -> Result<Revision, CoordError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.revision())
            .await
            .map_err(|e| CoordError::Internal(format!("revision probe failed: {}", e)))?
    }

    /// Wait until the revision exceeds `since` or `timeout` elapses.
    ///
    /// Returns the revision observed last. A return value equal to (or not
    /// greater than) `since` means the wait timed out; timing out is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Only storage failures while probing the durable revision.
    pub async fn wait_for_revision(
        &self,
        since: Revision,
        timeout: Duration,
    ) -> Result<Revision, CoordError> {
        // An unrepresentable deadline means "wait indefinitely".
        let deadline = Instant::now().checked_add(timeout);
        // Subscribe before the first probe so no commit slips between them.
        let mut wake = self.store.subscribe();

        loop {
            let current = self.current_revision().await?;
            if current > since {
                return Ok(current);
            }

            let nap = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::trace!(since = %since, "revision wait timed out");
                        return Ok(current);
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };

            tokio::select! {
                changed = wake.changed() => {
                    if changed.is_err() {
                        // Signal gone; fall back to plain polling.
                        tokio::time::sleep(nap).await;
                    }
                }
                _ = tokio::time::sleep(nap) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bump(store: &DocumentStore) -> Revision {
        let snapshot = store.load().unwrap();
        store.update(snapshot.revision, |doc| doc).unwrap().revision
    }

    #[tokio::test]
    async fn returns_immediately_when_already_ahead() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::open(temp.path().join("state.json"));
        bump(&store);

        let notifier = ChangeNotifier::new(store);
        let started = std::time::Instant::now();
        let seen = notifier
            .wait_for_revision(Revision::ZERO, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(seen, Revision::new(1));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn timeout_returns_unchanged_revision() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::open(temp.path().join("state.json"));
        let since = store.load().unwrap().revision;

        let notifier = ChangeNotifier::new(store);
        let started = std::time::Instant::now();
        let seen = notifier
            .wait_for_revision(since, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(seen, since);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn zero_timeout_probes_once() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::open(temp.path().join("state.json"));
        let notifier = ChangeNotifier::new(store);
        let seen = notifier
            .wait_for_revision(Revision::ZERO, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(seen, Revision::ZERO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn in_process_write_wakes_waiter_before_poll() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::open(temp.path().join("state.json"));
        let since = store.load().unwrap().revision;

        // Poll interval far beyond the test's patience: only the signal can wake us.
        let notifier = ChangeNotifier::new(store.clone()).with_poll_interval(Duration::from_secs(30));
        let writer = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tokio::task::spawn_blocking(move || bump(&writer)).await.unwrap();
        });

        let started = std::time::Instant::now();
        let seen = notifier
            .wait_for_revision(since, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(seen, Revision::new(1));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
