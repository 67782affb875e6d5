//! core::paths
//!
//! Centralized path routing for the state document and its companions.
//!
//! # Storage Layout
//!
//! For a state file at `<dir>/state.json`:
//! - `<dir>/state.json` - The durable document
//! - `<dir>/state.json.lock` - Sidecar file carrying the OS-level write lock
//! - `<dir>/state.json.tmp` - Staging file for atomic replace
//!
//! **Hard rule:** no code outside this module derives these paths.
//!
//! # Example
//!
//! ```
//! use agentstate::core::paths::StatePaths;
//! use std::path::PathBuf;
//!
//! let paths = StatePaths::new("/var/agents/state.json");
//! assert_eq!(paths.lock_path(), PathBuf::from("/var/agents/state.json.lock"));
//! assert_eq!(paths.dir(), PathBuf::from("/var/agents"));
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default state file location, relative to the working directory.
pub const DEFAULT_STATE_PATH: &str = ".agentstate/state.json";

/// Path routing for one state document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    state_file: PathBuf,
}

impl StatePaths {
    /// Route paths for the document stored at `state_file`.
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
        }
    }

    /// The durable document.
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Directory holding the document; `.` for bare relative file names.
    pub fn dir(&self) -> PathBuf {
        match self.state_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Sidecar lock file serializing writers across processes.
    pub fn lock_path(&self) -> PathBuf {
        self.with_suffix(".lock")
    }

    /// Staging file that is renamed over the document on commit.
    pub fn temp_path(&self) -> PathBuf {
        self.with_suffix(".tmp")
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut path: OsString = self.state_file.as_os_str().to_os_string();
        path.push(suffix);
        PathBuf::from(path)
    }
}

impl Default for StatePaths {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_PATH)
    }
}
