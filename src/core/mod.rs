//! core
//!
//! The shared-state engine.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Revision, UtcTimestamp, LockEntry
//! - [`document`] - The persisted root document
//! - [`error`] - Error taxonomy
//! - [`paths`] - Centralized path routing for the state file
//! - [`config`] - Configuration schema and loading
//! - [`store`] - Durable compare-and-swap storage and transactions
//! - [`notify`] - Long-poll on revision changes
//! - [`stream`] - Revision pulse stream
//! - [`locks`] - Resource locks and panic mode
//!
//! # Design Principles
//!
//! - The revision is the only concurrency token
//! - All mutation flows through compare-and-swap updates
//! - Global switches live in the document, never in process memory

pub mod config;
pub mod document;
pub mod error;
pub mod locks;
pub mod notify;
pub mod paths;
pub mod store;
pub mod stream;
pub mod types;
