// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for fast recovery.
//!
//! A snapshot stores the complete projection covering all events up to its
//! `seq`; recovery loads it and replays only the tail of the log. The
//! stored `seq` is authoritative: a snapshot that cannot be parsed (or
//! lacks `seq`) aborts startup rather than guessing.

use crate::RuntimeState;
use relay_core::{Job, JobId, Session, ThreadId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// Errors that can occur in snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported snapshot version {0}")]
    Version(u32),
}

/// The full projection at a point in time, identified by `seq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Event sequence number this snapshot covers.
    pub seq: u64,
    pub sessions: HashMap<ThreadId, Session>,
    pub jobs: HashMap<JobId, Job>,
    pub dedupe: HashMap<String, JobId>,
}

impl Snapshot {
    /// Capture the current projection.
    pub fn capture(state: &RuntimeState) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            seq: state.last_seq,
            sessions: state.sessions.clone(),
            jobs: state.jobs.clone(),
            dedupe: state.dedupe.clone(),
        }
    }

    /// Rebuild the projection this snapshot stores.
    pub fn into_state(self) -> RuntimeState {
        RuntimeState {
            sessions: self.sessions,
            jobs: self.jobs,
            dedupe: self.dedupe,
            last_seq: self.seq,
        }
    }

    /// Save atomically: write `snapshot.json.tmp`, fsync, rename over the
    /// target.
    ///
    /// A crash mid-save leaves the previous snapshot intact.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // The full filename plus ".tmp", not an extension swap.
        let tmp_path = PathBuf::from(format!("{}.tmp", path.display()));

        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, self)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, path)?;
        debug!(path = %path.display(), seq = self.seq, "snapshot written");

        Ok(())
    }

    /// Load the snapshot if present.
    ///
    /// `Ok(None)` only when the file does not exist. Unparseable content is
    /// an error, not a fresh start.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        if snapshot.version != CURRENT_SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(snapshot.version));
        }
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
