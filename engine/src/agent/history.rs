//! Conversation History Store
//!
//! Append-only, size-bounded log of `Turn`s persisted as a JSON array. The
//! store is loaded, extended and persisted as one unit per turn. When a limit
//! is configured and exceeded, one trim drops the oldest 20% of turns (at
//! least one); survivors keep their order.
//!
//! A missing or malformed file loads as an empty history. A file that exists
//! but cannot be read is an error, so the caller can avoid writing over it.
//! Writes go through a temporary file in the same directory and are renamed
//! into place, so a crash mid-write never leaves a truncated array behind.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use sdk::errors::EngineError;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::llm::Turn;

/// Canonical contents of an empty history file
pub const EMPTY_HISTORY: &str = "[]";

/// Size-bounded conversation history backed by a JSON file
#[derive(Debug, Clone)]
pub struct HistoryStore {
    /// Location of the history file
    path: PathBuf,

    /// Maximum number of turns kept; 0 disables trimming
    limit: usize,

    /// Turns in chronological order
    turns: Vec<Turn>,
}

impl HistoryStore {
    /// An empty history that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
            turns: Vec::new(),
        }
    }

    /// Load history from `path`.
    ///
    /// A missing file or malformed content yields an empty history. Fails
    /// with `HistoryRead` only when the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>, limit: usize) -> Result<Self, EngineError> {
        let mut store = Self::new(path, limit);

        let contents = match fs::read_to_string(&store.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(store),
            Err(e) => {
                return Err(EngineError::HistoryRead(format!("{:?}: {}", store.path, e)));
            }
        };

        match serde_json::from_str(&contents) {
            Ok(turns) => store.turns = turns,
            Err(e) => warn!(
                "Malformed history {:?}: {}; starting with empty history",
                store.path, e
            ),
        }

        debug!("Loaded {} history turns from {:?}", store.turns.len(), store.path);
        Ok(store)
    }

    /// Create the history file with an empty array if it does not exist yet.
    pub fn initialize(path: &Path) -> Result<(), EngineError> {
        if path.exists() {
            return Ok(());
        }
        fs::write(path, EMPTY_HISTORY).map_err(|e| {
            EngineError::StateDirectory(format!("Failed to create history file: {}", e))
        })
    }

    /// Get all turns in order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Add turns to the tail
    pub fn append(&mut self, turns: impl IntoIterator<Item = Turn>) {
        self.turns.extend(turns);
    }

    /// Drop the oldest `eviction_count(len)` turns if the limit is exceeded.
    ///
    /// A single pass: a log far over the limit may still exceed it afterwards.
    /// Returns the number of turns removed.
    pub fn trim_if_over_limit(&mut self) -> usize {
        if self.limit == 0 || self.turns.len() <= self.limit {
            return 0;
        }

        let removed = eviction_count(self.turns.len());
        self.turns.drain(..removed);
        debug!(
            "Trimmed {} oldest history turns (limit {}, {} left)",
            removed,
            self.limit,
            self.turns.len()
        );
        removed
    }

    /// Write the full history back to disk, replacing the previous file.
    pub fn persist(&self) -> Result<(), EngineError> {
        let data = serde_json::to_vec(&self.turns)
            .map_err(|e| EngineError::HistoryWrite(format!("Failed to encode history: {}", e)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| EngineError::HistoryWrite(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(&data)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| EngineError::HistoryWrite(format!("Failed to write history: {}", e)))?;
        tmp.persist(&self.path).map_err(|e| {
            EngineError::HistoryWrite(format!("Failed to replace history file: {}", e.error))
        })?;

        Ok(())
    }

    /// Reset to an empty history and persist immediately
    pub fn clear(&mut self) -> Result<(), EngineError> {
        self.turns.clear();
        self.persist()
    }
}

/// Number of turns one trim removes from a log of `len` turns:
/// 20% rounded up, never less than one.
pub fn eviction_count(len: usize) -> usize {
    (len * 2).div_ceil(10).max(1)
}
