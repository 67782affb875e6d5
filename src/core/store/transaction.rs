//! core::store::transaction
//!
//! Read-modify-write with transparent retry on revision conflicts.
//!
//! Each attempt loads fresh state, re-derives the next document from it and
//! tries a compare-and-swap. Only [`CoordError::StaleRevision`] is retried;
//! any other failure, from the operation or the store, returns immediately.
//! A lost race therefore never loses an update: the losing attempt's result
//! is discarded and recomputed from the winner's state.

use std::thread;
use std::time::Duration;

use rand::Rng;

use super::DocumentStore;
use crate::core::document::PersistedDocument;
use crate::core::error::CoordError;

/// Default attempt budget per transaction.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How hard a transaction tries before reporting contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Base of the jittered linear backoff between attempts; zero disables it.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Pause before retry number `attempt` (1-based): `base * attempt` plus up
    /// to one `base` of jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.backoff_base.is_zero() {
            return Duration::ZERO;
        }
        let base_micros = self.backoff_base.as_micros().min(u64::MAX as u128) as u64;
        let jitter = rand::rng().random_range(0..=base_micros);
        self.backoff_base.saturating_mul(attempt) + Duration::from_micros(jitter)
    }
}

/// Run `operation` as a transaction against `store`.
///
/// `operation` receives the freshly loaded document and returns the next
/// document plus a result value. It may run more than once, so it must not
/// have side effects outside its return value.
///
/// # Errors
///
/// - Whatever `operation` returns, unchanged and without retry
/// - Non-conflict store errors, converted into `E`
/// - [`CoordError::RetriesExhausted`] when every attempt lost the race
pub fn run_transaction<T, E, F>(
    store: &DocumentStore,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(PersistedDocument) -> Result<(PersistedDocument, T), E>,
    E: From<CoordError>,
{
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        let snapshot = store.load()?;
        let (next, value) = operation(snapshot.document)?;

        match store.update(snapshot.revision, move |_| next) {
            Ok(_) => return Ok(value),
            Err(err) if err.is_retryable() => {
                tracing::debug!(attempt, max = max_attempts, "transaction conflict: {}", err);
                if attempt < max_attempts {
                    let pause = policy.backoff(attempt);
                    if !pause.is_zero() {
                        thread::sleep(pause);
                    }
                }
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(CoordError::RetriesExhausted {
        attempts: max_attempts,
    }
    .into())
}
