//! Session snapshots keyed by puzzle id, stored as JSON strings in any
//! key/value store.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::session::{AttemptRecord, SessionState, Status, MAX_ATTEMPTS};

/// Default prefix for snapshot keys.
pub const DEFAULT_KEY_PREFIX: &str = "chessle-";

/// Key/value string storage. No transactional guarantees are expected.
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// File for `key`. Bytes outside `[A-Za-z0-9-]` are percent-encoded so
    /// distinct keys never share a file.
    fn path(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path(key), value)?;
        Ok(())
    }
}

/// Persisted progress for one puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub history: Vec<AttemptRecord>,
    pub attempt_number: u32,
    pub status: Status,
}

impl Snapshot {
    /// Whether this snapshot describes a state the session could have been in.
    pub fn is_valid(&self) -> bool {
        if !(1..=MAX_ATTEMPTS).contains(&self.attempt_number) {
            return false;
        }
        if self.history.iter().any(|record| record.feedback.is_empty()) {
            return false;
        }

        let attempts = self.history.len() as u32;
        match self.status {
            Status::Playing => attempts == self.attempt_number - 1,
            Status::Won => {
                attempts == self.attempt_number
                    && self.history.last().is_some_and(AttemptRecord::is_solved)
            }
            Status::Lost => attempts == MAX_ATTEMPTS && self.attempt_number == MAX_ATTEMPTS,
            Status::Loading | Status::Error => false,
        }
    }
}

pub fn storage_key(prefix: &str, puzzle_id: &str) -> String {
    format!("{prefix}{puzzle_id}")
}

/// Write a snapshot of `state`. Returns `false` when there is nothing worth
/// saving (still loading, or failed).
pub fn save<S: SnapshotStore + ?Sized>(
    store: &mut S,
    prefix: &str,
    state: &SessionState,
) -> Result<bool, StoreError> {
    if matches!(state.status(), Status::Loading | Status::Error) {
        return Ok(false);
    }
    let Some(puzzle) = state.puzzle() else {
        return Ok(false);
    };

    let snapshot = Snapshot {
        history: state.history().to_vec(),
        attempt_number: state.attempt_number(),
        status: state.status(),
    };
    let key = storage_key(prefix, &puzzle.id);
    store.set(&key, &serde_json::to_string(&snapshot)?)?;

    debug!(%key, status = %snapshot.status, "Saved session snapshot");
    Ok(true)
}

/// Read a prior snapshot. Anything unreadable or structurally invalid is
/// discarded and reported as absent.
pub fn load<S: SnapshotStore + ?Sized>(store: &S, prefix: &str, puzzle_id: &str) -> Option<Snapshot> {
    let key = storage_key(prefix, puzzle_id);
    let raw = match store.get(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(%key, "Failed to read session snapshot: {e}");
            return None;
        }
    };

    match serde_json::from_str::<Snapshot>(&raw) {
        Ok(snapshot) if snapshot.is_valid() => Some(snapshot),
        Ok(_) => {
            warn!(%key, "Discarding inconsistent session snapshot");
            None
        }
        Err(e) => {
            warn!(%key, "Discarding malformed session snapshot: {e}");
            None
        }
    }
}
