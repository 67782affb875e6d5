//! core::error
//!
//! Error taxonomy of the state engine.
//!
//! # Classes
//!
//! - Conflict: [`CoordError::StaleRevision`], retried only inside transactions
//! - Policy: [`CoordError::PanicMode`], [`CoordError::ResourceLocked`]
//! - Request: [`CoordError::Invalid`]
//! - Internal: everything else; always fatal to the calling operation
//!
//! The engine returns errors unchanged to its caller and never reports them
//! on the caller's behalf.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::{Revision, UtcTimestamp};

/// Errors from state-engine operations.
#[derive(Debug, Error)]
pub enum CoordError {
    /// The caller's expected revision no longer matches durable state.
    #[error("stale revision: expected {expected}, found {actual}")]
    StaleRevision {
        /// Revision the caller last observed.
        expected: Revision,
        /// Revision found on disk at write time.
        actual: Revision,
    },

    /// Lock acquisition attempted while the emergency flag is set.
    #[error("panic mode is active: lock acquisition is disabled")]
    PanicMode,

    /// A requested resource is held by another, non-expired owner.
    #[error("resource '{resource}' is locked by '{owner}' until {expires_at}")]
    ResourceLocked {
        /// The conflicting resource.
        resource: String,
        /// Its current holder.
        owner: String,
        /// When the holder's lock lapses.
        expires_at: UtcTimestamp,
    },

    /// A transaction kept losing the compare-and-swap race.
    #[error("transaction failed after max retries ({attempts} attempts)")]
    RetriesExhausted {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The state file or its lock could not be read or written.
    #[error("state i/o error at '{path}': {source}")]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The state file exists but does not parse.
    #[error("corrupt state document at '{path}': {source}")]
    Corrupt {
        /// The unparseable state file.
        path: PathBuf,
        /// Parser error with line and column.
        source: serde_json::Error,
    },

    /// The sidecar store lock stayed contended past the configured timeout.
    #[error("timed out waiting for store lock '{path}'")]
    LockTimeout {
        /// The contended sidecar lock file.
        path: PathBuf,
    },

    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Any other internal failure (invariant violation, task failure).
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoordError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this failure is a compare-and-swap conflict worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleRevision { .. })
    }

    /// Whether this failure belongs to the internal-error class: unreadable or
    /// corrupt storage, exhausted retries, or a broken invariant.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::RetriesExhausted { .. }
                | Self::Io { .. }
                | Self::Corrupt { .. }
                | Self::LockTimeout { .. }
                | Self::Internal(_)
        )
    }
}
