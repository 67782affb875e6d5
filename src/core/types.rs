//! core::types
//!
//! Strong types shared by the state engine.
//!
//! # Types
//!
//! - [`Revision`] - Optimistic-concurrency token of the persisted document
//! - [`UtcTimestamp`] - RFC3339 timestamp used for lock bookkeeping
//! - [`LockEntry`] - A held resource lock
//!
//! # Examples
//!
//! ```
//! use agentstate::core::types::Revision;
//!
//! let rev = Revision::new(4);
//! assert_eq!(rev.next(), Some(Revision::new(5)));
//! assert!(Revision::new(5) > rev);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Monotonically increasing version stamp of the persisted document.
///
/// A write succeeds only when the caller's last-observed revision equals the
/// durable one; every successful write advances it by exactly one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    /// The revision of a freshly created document.
    pub const ZERO: Revision = Revision(0);

    /// Wrap a raw revision number.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw revision number.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The revision a successful write produces, or `None` on overflow.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl From<u64> for Revision {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC timestamp, serialized as RFC3339.
///
/// # Example
///
/// ```
/// use agentstate::core::types::UtcTimestamp;
/// use std::time::Duration;
///
/// let now = UtcTimestamp::now();
/// let later = now.checked_add(Duration::from_millis(10)).unwrap();
/// assert!(later > now);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }

    /// Add a duration, returning `None` if the result is out of range.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        let delta = chrono::Duration::from_std(duration).ok()?;
        self.0.checked_add_signed(delta).map(Self)
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A resource lock recorded in the document's `locks` collection.
///
/// `expires_at` is always `acquired_at + ttl`. An entry whose expiry has
/// passed is treated as absent even while it is still physically stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockEntry {
    /// Locked resource; unique among stored entries.
    pub resource_id: String,
    /// Identity of the holder.
    pub owner: String,
    /// When the lock was granted or last refreshed.
    pub acquired_at: UtcTimestamp,
    /// When the lock lapses.
    pub expires_at: UtcTimestamp,
}

impl LockEntry {
    /// Create an entry granted at `now` for `ttl`.
    ///
    /// Returns `None` if `now + ttl` overflows the timestamp range.
    pub fn new(
        resource_id: impl Into<String>,
        owner: impl Into<String>,
        now: UtcTimestamp,
        ttl: Duration,
    ) -> Option<Self> {
        Some(Self {
            resource_id: resource_id.into(),
            owner: owner.into(),
            acquired_at: now,
            expires_at: now.checked_add(ttl)?,
        })
    }

    /// Whether the lock has lapsed at `now` (strictly after expiry).
    pub fn is_expired_at(&self, now: &UtcTimestamp) -> bool {
        *now > self.expires_at
    }

    /// Whether `owner` holds this entry.
    pub fn is_held_by(&self, owner: &str) -> bool {
        self.owner == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_ordering_and_next() {
        let r = Revision::new(7);
        assert_eq!(r.next(), Some(Revision::new(8)));
        assert!(Revision::new(8) > r);
        assert_eq!(Revision::new(u64::MAX).next(), None);
        assert_eq!(Revision::default(), Revision::ZERO);
    }

    #[test]
    fn revision_serializes_as_plain_number() {
        let json = serde_json::to_string(&Revision::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: Revision = serde_json::from_str("42").unwrap();
        assert_eq!(back, Revision::new(42));
    }

    #[test]
    fn lock_entry_expiry_is_acquired_plus_ttl() {
        let now = UtcTimestamp::now();
        let entry = LockEntry::new("R1", "alice", now, Duration::from_millis(1000)).unwrap();
        let delta = *entry.expires_at.as_datetime() - *entry.acquired_at.as_datetime();
        assert_eq!(delta.num_milliseconds(), 1000);
    }

    #[test]
    fn lock_entry_expired_only_strictly_after_expiry() {
        let now = UtcTimestamp::now();
        let entry = LockEntry::new("R1", "alice", now, Duration::from_millis(10)).unwrap();
        assert!(!entry.is_expired_at(&now));
        assert!(!entry.is_expired_at(&entry.expires_at));
        let after = entry.expires_at.checked_add(Duration::from_millis(1)).unwrap();
        assert!(entry.is_expired_at(&after));
    }

    #[test]
    fn lock_entry_uses_camel_case_keys() {
        let entry =
            LockEntry::new("R1", "alice", UtcTimestamp::now(), Duration::from_secs(1)).unwrap();
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("resourceId").is_some());
        assert!(value.get("acquiredAt").is_some());
        assert!(value.get("expiresAt").is_some());
    }
}
