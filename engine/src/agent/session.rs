//! Session Context
//!
//! Paths shared by every component of a session, resolved once at startup
//! and passed explicitly. Tests build one over a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use sdk::errors::EngineError;

use super::history::HistoryStore;

/// File name of the persisted conversation inside the state directory
pub const HISTORY_FILE: &str = "history.json";

/// File name of the last workspace listing inside the state directory
pub const SNAPSHOT_FILE: &str = "fs_snapshot.txt";

#[derive(Debug, Clone)]
pub struct SessionContext {
    work_dir: PathBuf,
    state_dir: PathBuf,
    history_path: PathBuf,
    snapshot_path: PathBuf,
}

impl SessionContext {
    /// Resolve the state directory under `work_dir`, create it and make sure
    /// a history file exists.
    ///
    /// An absolute `state_dir` is used as is.
    pub fn new(work_dir: impl Into<PathBuf>, state_dir: &Path) -> Result<Self, EngineError> {
        let work_dir = work_dir.into();
        let state_dir = work_dir.join(state_dir);

        fs::create_dir_all(&state_dir).map_err(|e| {
            EngineError::StateDirectory(format!(
                "Failed to create context directory {:?}: {}",
                state_dir, e
            ))
        })?;

        let history_path = state_dir.join(HISTORY_FILE);
        HistoryStore::initialize(&history_path)?;

        Ok(Self {
            snapshot_path: state_dir.join(SNAPSHOT_FILE),
            work_dir,
            state_dir,
            history_path,
        })
    }

    /// Build a session rooted at the process's current directory.
    pub fn from_current_dir(state_dir: &Path) -> Result<Self, EngineError> {
        let cwd = std::env::current_dir().map_err(|e| {
            EngineError::WorkingDirectory(format!("Failed to get current directory: {}", e))
        })?;
        Self::new(cwd, state_dir)
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}
