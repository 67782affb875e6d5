//! agentstate - Shared, revisioned on-disk state for cooperating agents
//!
//! Independent agent processes on one machine share a single JSON document
//! (tasks, messages, locks, agent registry, ...) through this crate. The
//! document carries a revision counter; every write is a compare-and-swap
//! against it, so concurrent writers never lose each other's updates.
//!
//! # Architecture
//!
//! - [`core`] - The state engine: store, transactions, notifier, locks
//! - [`cli`] - The `ags` command-line interface
//!
//! # Correctness Invariants
//!
//! 1. A write succeeds iff the caller's revision equals the durable one
//! 2. Every successful write advances the revision by exactly one
//! 3. Writes are durable and atomic before the call returns
//! 4. No two owners hold the same resource lock at the same instant
//!
//! # Example
//!
//! ```no_run
//! use agentstate::core::store::DocumentStore;
//! use agentstate::core::error::CoordError;
//!
//! let store = DocumentStore::open(".agentstate/state.json");
//! let count = store.transaction(|mut doc| {
//!     let n: u64 = doc.collection_as("counter")?.unwrap_or(0);
//!     doc.set_collection("counter", &(n + 1))?;
//!     Ok::<_, CoordError>((doc, n + 1))
//! })?;
//! println!("counter is now {}", count);
//! # Ok::<(), CoordError>(())
//! ```

pub mod cli;
pub mod core;

pub use crate::core::document::{PersistedDocument, Snapshot};
pub use crate::core::error::CoordError;
pub use crate::core::locks::LockManager;
pub use crate::core::notify::ChangeNotifier;
pub use crate::core::store::{run_transaction, DocumentStore, RetryPolicy, StoreOptions};
pub use crate::core::stream::{Pulse, PulseKind, RevisionStream};
pub use crate::core::types::{LockEntry, Revision, UtcTimestamp};
