//! core::store::file_lock
//!
//! Exclusive OS-level lock serializing writers of one state document.
//!
//! # Architecture
//!
//! The compare-and-swap in [`DocumentStore::update`](super::DocumentStore::update)
//! must be atomic across processes. Writers take an exclusive `fs2` lock on
//! the sidecar `<state>.lock` file for the duration of read-check-write.
//! Readers never take it: the document is replaced by atomic rename, so a
//! reader sees either the old or the new file.
//!
//! # Invariants
//!
//! - Lock is held for the whole read-check-write of one update
//! - Lock is released on drop (RAII pattern)
//! - Acquisition polls until a deadline; it never blocks indefinitely
//! - Each acquisition opens its own handle, so threads of one process
//!   exclude each other exactly like separate processes do

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::core::error::CoordError;
use crate::core::paths::StatePaths;

/// Polling interval while the lock is contended.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// An exclusive lock on a state document's sidecar file.
#[derive(Debug)]
pub struct StoreLock {
    /// Path to the lock file.
    path: PathBuf,
    /// The open file handle with the lock held.
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl StoreLock {
    /// Acquire the lock, polling until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// - [`CoordError::LockTimeout`] if the lock stays contended past `timeout`
    /// - [`CoordError::Io`] if the lock file cannot be created or locked
    pub fn acquire(paths: &StatePaths, timeout: Duration) -> Result<Self, CoordError> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if let Some(lock) = Self::try_acquire(paths)? {
                return Ok(lock);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(CoordError::LockTimeout {
                    path: paths.lock_path(),
                });
            }
            thread::sleep(LOCK_POLL_INTERVAL);
        }
    }

    /// Try to acquire the lock without waiting.
    ///
    /// Returns `Ok(None)` if another handle holds it.
    pub fn try_acquire(paths: &StatePaths) -> Result<Option<Self>, CoordError> {
        let dir = paths.dir();
        fs::create_dir_all(&dir).map_err(|e| CoordError::io(&dir, e))?;

        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| CoordError::io(&path, e))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                path,
                file: Some(file),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(CoordError::io(&path, e)),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly.
    ///
    /// This is called automatically on drop.
    pub fn release(&mut self) -> Result<(), CoordError> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file).map_err(|e| CoordError::io(&self.path, e))?;
        }
        Ok(())
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Best-effort release on drop - ignore errors since we're dropping
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths(dir: &Path) -> StatePaths {
        StatePaths::new(dir.join("nested").join("state.json"))
    }

    #[test]
    fn acquire_creates_directory_and_lock_file() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let lock = StoreLock::acquire(&paths, Duration::from_secs(1)).expect("acquire lock");
        assert!(lock.is_held());
        assert!(lock.path().exists());
        assert_eq!(lock.path(), paths.lock_path());
    }

    #[test]
    fn second_handle_is_excluded() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let _lock = StoreLock::acquire(&paths, Duration::from_secs(1)).expect("first acquire");
        assert!(StoreLock::try_acquire(&paths).expect("try").is_none());
    }

    #[test]
    fn contended_acquire_times_out() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let _lock = StoreLock::acquire(&paths, Duration::from_secs(1)).expect("first acquire");
        let result = StoreLock::acquire(&paths, Duration::from_millis(20));
        assert!(matches!(result, Err(CoordError::LockTimeout { .. })));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        {
            let lock = StoreLock::acquire(&paths, Duration::from_secs(1)).expect("acquire");
            assert!(lock.is_held());
        }

        let lock = StoreLock::try_acquire(&paths).expect("try").expect("available");
        assert!(lock.is_held());
    }

    #[test]
    fn multiple_release_calls_are_safe() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let mut lock = StoreLock::acquire(&paths, Duration::from_secs(1)).expect("acquire");
        lock.release().expect("first release");
        lock.release().expect("second release should be ok");
        assert!(!lock.is_held());

        let again = StoreLock::try_acquire(&paths).expect("try");
        assert!(again.is_some());
    }

    #[test]
    fn waiter_gets_lock_after_holder_drops() {
        let temp = TempDir::new().expect("create temp dir");
        let paths = test_paths(temp.path());

        let lock = StoreLock::acquire(&paths, Duration::from_secs(1)).expect("acquire");
        let waiter_paths = paths.clone();
        let waiter = thread::spawn(move || {
            StoreLock::acquire(&waiter_paths, Duration::from_secs(5)).map(|l| l.is_held())
        });

        thread::sleep(Duration::from_millis(20));
        drop(lock);

        assert!(waiter.join().expect("join").expect("waiter acquires"));
    }
}
