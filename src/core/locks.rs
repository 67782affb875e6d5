//! core::locks
//!
//! Named resource locks with owners, TTLs, and a global panic switch.
//!
//! # Architecture
//!
//! The lock table is the document's `locks` collection and the panic
//! switch is its `panic_mode` flag; both change only through store
//! transactions, so they obey the same compare-and-swap discipline as
//! every other seam.
//!
//! Per resource: `unlocked -> locked(owner, expires_at) -> unlocked`, on
//! release or expiry. Expired entries count as absent and are pruned by the
//! next acquire, release or reap.
//!
//! # Invariants
//!
//! - Acquisition is all-or-nothing across the requested set
//! - No acquisition succeeds while panic mode is set
//! - Re-acquiring a lock you hold refreshes its TTL
//! - Releasing a lock you do not hold is a no-op
//!
//! # Example
//!
//! ```no_run
//! use agentstate::core::locks::LockManager;
//! use agentstate::core::store::DocumentStore;
//! use std::time::Duration;
//!
//! let locks = LockManager::new(DocumentStore::open("/tmp/agents/state.json"));
//! let granted = locks.acquire(["repo/main", "ci"], "alice", Duration::from_secs(60))?;
//! assert_eq!(granted.len(), 2);
//! locks.release(["repo/main", "ci"], "alice")?;
//! # Ok::<(), agentstate::core::error::CoordError>(())
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use crate::core::error::CoordError;
use crate::core::store::DocumentStore;
use crate::core::types::{LockEntry, UtcTimestamp};

/// Lock manager over a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct LockManager {
    store: DocumentStore,
}

impl LockManager {
    /// Manage locks stored in `store`'s document.
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Acquire every resource in `resource_ids` for `owner` for `ttl`.
    ///
    /// Duplicate ids are collapsed. An empty set grants nothing and writes
    /// nothing, but is still refused while the panic flag is set.
    ///
    /// # Errors
    ///
    /// - [`CoordError::PanicMode`] if the panic flag is set
    /// - [`CoordError::ResourceLocked`] if any resource is held by another
    ///   non-expired owner; nothing is granted
    /// - [`CoordError::Invalid`] for an empty owner or resource id, or a TTL
    ///   beyond the timestamp range
    pub fn acquire<I, S>(
        &self,
        resource_ids: I,
        owner: &str,
        ttl: Duration,
    ) -> Result<Vec<LockEntry>, CoordError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acquire_with(resource_ids, owner, ttl, UtcTimestamp::now)
    }

    pub(crate) fn acquire_at<I, S>(
        &self,
        resource_ids: I,
        owner: &str,
        ttl: Duration,
        now: UtcTimestamp,
    ) -> Result<Vec<LockEntry>, CoordError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acquire_with(resource_ids, owner, ttl, move || now)
    }

    /// Acquire with an explicit clock, read afresh on every transaction
    /// attempt so retries grant the full TTL.
    pub(crate) fn acquire_with<I, S, C>(
        &self,
        resource_ids: I,
        owner: &str,
        ttl: Duration,
        clock: C,
    ) -> Result<Vec<LockEntry>, CoordError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        C: Fn() -> UtcTimestamp,
    {
        if self.panic_mode()? {
            return Err(CoordError::PanicMode);
        }

        let requested = normalize(resource_ids)?;
        validate_owner(owner)?;
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let granted = self.store.transaction(|mut doc| {
            if doc.panic_mode {
                return Err(CoordError::PanicMode);
            }
            let now = clock();

            for id in &requested {
                if let Some(held) = doc.lock_for(id, &now) {
                    if !held.is_held_by(owner) {
                        return Err(CoordError::ResourceLocked {
                            resource: held.resource_id.clone(),
                            owner: held.owner.clone(),
                            expires_at: held.expires_at,
                        });
                    }
                }
            }

            doc.locks.retain(|e| !e.is_expired_at(&now));

            let mut granted = Vec::with_capacity(requested.len());
            for id in &requested {
                let entry = LockEntry::new(id.as_str(), owner, now, ttl).ok_or_else(|| {
                    CoordError::Invalid(format!("ttl {:?} is out of range", ttl))
                })?;
                match doc.locks.iter_mut().find(|e| e.resource_id == *id) {
                    Some(existing) => *existing = entry.clone(),
                    None => doc.locks.push(entry.clone()),
                }
                granted.push(entry);
            }

            Ok((doc, granted))
        })?;

        tracing::debug!(owner, count = granted.len(), "granted locks");
        Ok(granted)
    }

    /// Release the resources in `resource_ids` held by `owner`.
    ///
    /// Returns the ids actually released. Resources not held by `owner` are
    /// skipped silently.
    ///
    /// # Errors
    ///
    /// [`CoordError::Invalid`] for an empty owner or resource id.
    pub fn release<I, S>(&self, resource_ids: I, owner: &str) -> Result<Vec<String>, CoordError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.release_at(resource_ids, owner, UtcTimestamp::now())
    }

    pub(crate) fn release_at<I, S>(
        &self,
        resource_ids: I,
        owner: &str,
        now: UtcTimestamp,
    ) -> Result<Vec<String>, CoordError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requested = normalize(resource_ids)?;
        validate_owner(owner)?;
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let released = self.store.transaction(|mut doc| {
            let mut released = Vec::new();
            doc.locks.retain(|e| {
                if requested.contains(&e.resource_id) && e.is_held_by(owner) {
                    released.push(e.resource_id.clone());
                    false
                } else {
                    !e.is_expired_at(&now)
                }
            });
            Ok::<_, CoordError>((doc, released))
        })?;

        tracing::debug!(owner, count = released.len(), "released locks");
        Ok(released)
    }

    /// Set or clear the global panic flag, returning its previous value.
    pub fn set_panic_mode(&self, enabled: bool) -> Result<bool, CoordError> {
        let previous = self.store.transaction(|mut doc| {
            let previous = doc.panic_mode;
            doc.panic_mode = enabled;
            Ok::<_, CoordError>((doc, previous))
        })?;
        if previous != enabled {
            tracing::debug!(enabled, "panic mode changed");
        }
        Ok(previous)
    }

    /// Whether the panic flag is currently set.
    pub fn panic_mode(&self) -> Result<bool, CoordError> {
        Ok(self.store.load()?.document.panic_mode)
    }

    /// Locks currently in force.
    pub fn active_locks(&self) -> Result<Vec<LockEntry>, CoordError> {
        let now = UtcTimestamp::now();
        Ok(self.store.load()?.document.active_locks(&now))
    }

    /// The non-expired holder of `resource_id`, if any.
    pub fn holder(&self, resource_id: &str) -> Result<Option<LockEntry>, CoordError> {
        let now = UtcTimestamp::now();
        Ok(self
            .store
            .load()?
            .document
            .lock_for(resource_id, &now)
            .cloned())
    }

    /// Prune expired entries, returning those removed.
    ///
    /// Skips the write entirely when nothing has expired.
    pub fn reap_expired(&self) -> Result<Vec<LockEntry>, CoordError> {
        self.reap_expired_at(UtcTimestamp::now())
    }

    pub(crate) fn reap_expired_at(&self, now: UtcTimestamp) -> Result<Vec<LockEntry>, CoordError> {
        let snapshot = self.store.load()?;
        if !snapshot.document.locks.iter().any(|e| e.is_expired_at(&now)) {
            return Ok(Vec::new());
        }

        let reaped = self.store.transaction(|mut doc| {
            let (expired, live): (Vec<_>, Vec<_>) =
                doc.locks.into_iter().partition(|e| e.is_expired_at(&now));
            doc.locks = live;
            Ok::<_, CoordError>((doc, expired))
        })?;

        tracing::debug!(count = reaped.len(), "reaped expired locks");
        Ok(reaped)
    }
}

fn normalize<I, S>(resource_ids: I) -> Result<BTreeSet<String>, CoordError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut set = BTreeSet::new();
    for id in resource_ids {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoordError::Invalid("resource id must not be empty".into()));
        }
        set.insert(id);
    }
    Ok(set)
}

fn validate_owner(owner: &str) -> Result<(), CoordError> {
    if owner.trim().is_empty() {
        return Err(CoordError::Invalid("owner must not be empty".into()));
    }
    Ok(())
}
