//! core::store
//!
//! Durable, revisioned storage of the shared document.
//!
//! # Architecture
//!
//! One JSON file holds the whole [`PersistedDocument`]. Its `revision` is the
//! only concurrency token:
//!
//! - [`DocumentStore::load`] reads the file without locking
//! - [`DocumentStore::update`] takes the sidecar [`StoreLock`], re-reads the
//!   durable revision, rejects the write with
//!   [`CoordError::StaleRevision`] if it moved, otherwise applies the
//!   mutator, bumps the revision and commits by atomic rename
//! - [`DocumentStore::transaction`] wraps both in a bounded retry loop
//!
//! # Crash Safety
//!
//! Writes go to `<state>.tmp`, are fsynced, then renamed over the document
//! and the directory is fsynced. A crash leaves either the old or the new
//! document visible, never a partial one.
//!
//! # Modules
//!
//! - [`file_lock`] - Cross-process writer lock
//! - [`transaction`] - Retry-on-conflict helper
//!
//! # Example
//!
//! ```no_run
//! use agentstate::core::store::DocumentStore;
//!
//! let store = DocumentStore::open("/tmp/agents/state.json");
//! let snapshot = store.load()?;
//! let updated = store.update(snapshot.revision, |mut doc| {
//!     doc.panic_mode = true;
//!     doc
//! })?;
//! assert_eq!(updated.revision.get(), snapshot.revision.get() + 1);
//! # Ok::<(), agentstate::core::error::CoordError>(())
//! ```

pub mod file_lock;
pub mod transaction;

pub use file_lock::StoreLock;
pub use transaction::{run_transaction, RetryPolicy, DEFAULT_MAX_ATTEMPTS};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::watch;

use crate::core::config::Config;
use crate::core::document::{PersistedDocument, Snapshot};
use crate::core::error::CoordError;
use crate::core::paths::StatePaths;
use crate::core::types::{Revision, UtcTimestamp};

/// Tunables for a [`DocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Max wait for the sidecar write lock.
    pub lock_timeout: Duration,
    /// How often waiters recheck the durable revision.
    pub poll_interval: Duration,
    /// Retry policy used by [`DocumentStore::transaction`].
    pub retry: RetryPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(50),
            retry: RetryPolicy::default(),
        }
    }
}

/// Handle to a durable state document.
///
/// Cloning is cheap; clones share the in-process revision signal, so a
/// waiter is woken immediately by writes made through any clone. Writes
/// from other handles or processes are observed by polling.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    paths: StatePaths,
    options: StoreOptions,
    revisions: watch::Sender<Revision>,
}

/// Minimal view used to read just the revision.
#[derive(Deserialize)]
struct RevisionProbe {
    #[serde(default)]
    revision: Revision,
}

impl DocumentStore {
    /// Open the document at `state_file` with default options.
    ///
    /// Nothing touches the disk until the first operation.
    pub fn open(state_file: impl AsRef<Path>) -> Self {
        Self::open_with(state_file, StoreOptions::default())
    }

    /// Open the document at `state_file` with explicit options.
    pub fn open_with(state_file: impl AsRef<Path>, options: StoreOptions) -> Self {
        let (revisions, _) = watch::channel(Revision::ZERO);
        Self {
            inner: Arc::new(StoreInner {
                paths: StatePaths::new(state_file.as_ref()),
                options,
                revisions,
            }),
        }
    }

    /// Open the document named by a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::open_with(config.state_path(), config.store_options())
    }

    /// Paths used by this store.
    pub fn paths(&self) -> &StatePaths {
        &self.inner.paths
    }

    /// Options this store was opened with.
    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    /// Load the current durable document and its revision.
    ///
    /// If no document exists yet, an empty one at revision zero is created
    /// and persisted first.
    ///
    /// # Errors
    ///
    /// Returns an internal-class error if the file is unreadable or corrupt.
    pub fn load(&self) -> Result<Snapshot, CoordError> {
        match self.read_document()? {
            Some(document) => Ok(Snapshot::from(document)),
            None => self.initialize(),
        }
    }

    /// Read only the durable revision.
    ///
    /// A missing document reports revision zero without creating it.
    pub fn revision(&self) -> Result<Revision, CoordError> {
        let path = self.paths().state_file();
        let Some(content) = self.read_raw()? else {
            return Ok(Revision::ZERO);
        };
        let probe: RevisionProbe =
            serde_json::from_str(&content).map_err(|source| CoordError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(probe.revision)
    }

    /// Compare-and-swap update.
    ///
    /// Under the writer lock: re-read the durable document, fail with
    /// [`CoordError::StaleRevision`] if its revision is not `expected`,
    /// otherwise apply `mutate` to it, set `revision = expected + 1`, and
    /// durably persist the result before returning it.
    ///
    /// The mutator cannot choose the revision; whatever it sets is
    /// overwritten. A result violating document invariants is rejected and
    /// nothing is written.
    pub fn update<F>(&self, expected: Revision, mutate: F) -> Result<PersistedDocument, CoordError>
    where
        F: FnOnce(PersistedDocument) -> PersistedDocument,
    {
        let lock = StoreLock::acquire(self.paths(), self.options().lock_timeout)?;

        let current = self.read_document()?.unwrap_or_default();
        if current.revision != expected {
            tracing::debug!(
                expected = %expected,
                actual = %current.revision,
                "rejecting stale update"
            );
            return Err(CoordError::StaleRevision {
                expected,
                actual: current.revision,
            });
        }

        let next_revision = current
            .revision
            .next()
            .ok_or_else(|| CoordError::Internal("revision counter overflow".into()))?;

        let mut next = mutate(current);
        next.revision = next_revision;
        next.updated_at = Some(UtcTimestamp::now());
        next.validate()?;

        self.persist(&next)?;
        drop(lock);

        tracing::trace!(revision = %next.revision, "committed document");
        self.publish(next.revision);
        Ok(next)
    }

    /// Run a read-modify-write with the store's retry policy.
    ///
    /// See [`run_transaction`].
    pub fn transaction<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut(PersistedDocument) -> Result<(PersistedDocument, T), E>,
        E: From<CoordError>,
    {
        run_transaction(self, &self.options().retry, operation)
    }

    /// Subscribe to revisions committed through this handle and its clones.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Revision> {
        self.inner.revisions.subscribe()
    }

    fn publish(&self, revision: Revision) {
        self.inner.revisions.send_if_modified(|seen| {
            if revision > *seen {
                *seen = revision;
                true
            } else {
                false
            }
        });
    }

    fn initialize(&self) -> Result<Snapshot, CoordError> {
        let _lock = StoreLock::acquire(self.paths(), self.options().lock_timeout)?;

        // Another writer may have created it while we waited.
        if let Some(document) = self.read_document()? {
            return Ok(Snapshot::from(document));
        }

        let document = PersistedDocument::empty();
        self.persist(&document)?;
        tracing::debug!(path = %self.paths().state_file().display(), "created state document");
        Ok(Snapshot::from(document))
    }

    fn read_raw(&self) -> Result<Option<String>, CoordError> {
        let path = self.paths().state_file();
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoordError::io(path, e)),
        }
    }

    fn read_document(&self) -> Result<Option<PersistedDocument>, CoordError> {
        let Some(content) = self.read_raw()? else {
            return Ok(None);
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| CoordError::Corrupt {
                path: self.paths().state_file().to_path_buf(),
                source,
            })
    }

    /// Atomically replace the durable document. Caller holds the lock.
    fn persist(&self, document: &PersistedDocument) -> Result<(), CoordError> {
        let paths = self.paths();
        let dir = paths.dir();
        fs::create_dir_all(&dir).map_err(|e| CoordError::io(&dir, e))?;

        let content = serde_json::to_string_pretty(document)
            .map_err(|e| CoordError::Internal(format!("cannot serialize document: {}", e)))?;

        let temp_path = paths.temp_path();
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| CoordError::io(&temp_path, e))?;

            file.write_all(content.as_bytes())
                .map_err(|e| CoordError::io(&temp_path, e))?;
            file.sync_all().map_err(|e| CoordError::io(&temp_path, e))?;
        }

        fs::rename(&temp_path, paths.state_file())
            .map_err(|e| CoordError::io(paths.state_file(), e))?;

        sync_dir(&dir)
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), CoordError> {
    fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| CoordError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), CoordError> {
    Ok(())
}
