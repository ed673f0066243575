//! Snapshot persistence at the engine boundary.
//!
//! The engine serializes to a [`Snapshot`] and restores from one; where
//! the snapshot lives is the caller's concern, expressed through the
//! [`SnapshotStore`] trait. Saves are best-effort: a failed save is
//! logged and reported, never rolled back into the engine, because the
//! in-memory state stays authoritative.

use crate::bets::Bet;
use crate::errors::{EngineError, EngineResult};
use crate::history::RoundHistoryEntry;
use crate::ledger::Transaction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Complete persistable engine state.
///
/// `history` and `transactions` are stored newest first, matching the
/// in-memory ring buffers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub balance: u64,
    pub round_id: u64,
    pub open_bets: Vec<Bet>,
    pub history: Vec<RoundHistoryEntry>,
    pub transactions: Vec<Transaction>,
    pub seed: String,
    pub sound_on: bool,
    pub vibrate_on: bool,
}

/// Where snapshots are loaded from and saved to.
pub trait SnapshotStore {
    /// Load the previously saved snapshot, or `None` on first run.
    fn load(&self) -> EngineResult<Option<Snapshot>>;

    /// Persist the snapshot.
    fn save(&self, snapshot: &Snapshot) -> EngineResult<()>;
}

/// Snapshot store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> EngineResult<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path).map_err(|e| EngineError::Persistence(e.to_string()))?;
        let snapshot =
            serde_json::from_slice(&bytes).map_err(|e| EngineError::Persistence(e.to_string()))?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> EngineResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| EngineError::Persistence(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| EngineError::Persistence(e.to_string()))?;
            }
        }
        // Write-then-rename so a crash mid-save never leaves a torn file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).map_err(|e| EngineError::Persistence(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| EngineError::Persistence(e.to_string()))?;
        Ok(())
    }
}

/// Fire-and-forget save. Failures are logged and swallowed; the engine
/// keeps operating from memory.
pub fn save_best_effort(store: &dyn SnapshotStore, snapshot: &Snapshot) {
    if let Err(err) = store.save(snapshot) {
        warn!(%err, "snapshot save failed; continuing from in-memory state");
    }
}
