//! core::document
//!
//! The single persisted root object shared by every agent process.
//!
//! # Schema
//!
//! ```json
//! {
//!   "revision": 12,
//!   "panic_mode": false,
//!   "locks": [
//!     {
//!       "resourceId": "repo/main",
//!       "owner": "alice",
//!       "acquiredAt": "2026-01-01T00:00:00Z",
//!       "expiresAt": "2026-01-01T00:01:00Z"
//!     }
//!   ],
//!   "updated_at": "2026-01-01T00:00:00Z",
//!   "tasks": [],
//!   "messages": []
//! }
//! ```
//!
//! Every top-level key other than the engine's own fields is an opaque
//! domain collection owned by an external seam. Those collections round-trip
//! unchanged through load and update unless a mutator touches them.
//!
//! # Invariants
//!
//! - `revision` is only ever set by the store, never by a mutator
//! - No two entries in `locks` share a `resourceId`
//! - No collection uses an engine field's name

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::CoordError;
use super::types::{LockEntry, Revision, UtcTimestamp};

/// Keys reserved for engine fields; seams cannot use them as collections.
pub const RESERVED_KEYS: &[&str] = &["revision", "panic_mode", "locks", "updated_at"];

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    /// Concurrency token; advanced by the store on every successful write.
    #[serde(default)]
    pub revision: Revision,

    /// Global emergency stop for lock acquisition.
    #[serde(default)]
    pub panic_mode: bool,

    /// Currently recorded locks, in grant order.
    #[serde(default)]
    pub locks: Vec<LockEntry>,

    /// Time of the last successful write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<UtcTimestamp>,

    /// Opaque domain collections (tasks, messages, agents, ...).
    #[serde(flatten)]
    pub collections: Map<String, Value>,
}

impl PersistedDocument {
    /// An empty document at revision zero.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check the document invariants that every write must preserve.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::Invalid`] if a collection shadows an engine
    /// field or two lock entries share a resource.
    pub fn validate(&self) -> Result<(), CoordError> {
        if let Some(key) = RESERVED_KEYS
            .iter()
            .find(|key| self.collections.contains_key(**key))
        {
            return Err(CoordError::Invalid(format!(
                "collection '{}' shadows a reserved document field",
                key
            )));
        }

        let mut seen = HashSet::with_capacity(self.locks.len());
        for entry in &self.locks {
            if !seen.insert(entry.resource_id.as_str()) {
                return Err(CoordError::Invalid(format!(
                    "duplicate lock entry for resource '{}'",
                    entry.resource_id
                )));
            }
        }
        Ok(())
    }

    /// Get a domain collection's raw JSON value.
    pub fn collection(&self, name: &str) -> Option<&Value> {
        self.collections.get(name)
    }

    /// Decode a domain collection into a typed value.
    ///
    /// Returns `Ok(None)` if the collection does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::Invalid`] if the stored value does not match `T`.
    pub fn collection_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, CoordError> {
        match self.collections.get(name) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| CoordError::Invalid(format!("collection '{}': {}", name, e))),
        }
    }

    /// Replace (or create) a domain collection.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::Invalid`] if `name` is an engine field or the
    /// value cannot be serialized.
    pub fn set_collection<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), CoordError> {
        if RESERVED_KEYS.contains(&name) {
            return Err(CoordError::Invalid(format!(
                "'{}' is a reserved document field",
                name
            )));
        }
        let value = serde_json::to_value(value)
            .map_err(|e| CoordError::Invalid(format!("collection '{}': {}", name, e)))?;
        self.collections.insert(name.to_string(), value);
        Ok(())
    }

    /// Remove a domain collection, returning its previous value.
    pub fn remove_collection(&mut self, name: &str) -> Option<Value> {
        self.collections.remove(name)
    }

    /// The non-expired lock on `resource_id`, if any.
    pub fn lock_for(&self, resource_id: &str, now: &UtcTimestamp) -> Option<&LockEntry> {
        self.locks
            .iter()
            .find(|e| e.resource_id == resource_id && !e.is_expired_at(now))
    }

    /// All locks still in force at `now`.
    pub fn active_locks(&self, now: &UtcTimestamp) -> Vec<LockEntry> {
        self.locks
            .iter()
            .filter(|e| !e.is_expired_at(now))
            .cloned()
            .collect()
    }
}

/// A loaded document together with the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The document as read from durable storage.
    pub document: PersistedDocument,
    /// The revision to pass back as the CAS precondition.
    pub revision: Revision,
}

impl From<PersistedDocument> for Snapshot {
    fn from(document: PersistedDocument) -> Self {
        let revision = document.revision;
        Self { document, revision }
    }
}
