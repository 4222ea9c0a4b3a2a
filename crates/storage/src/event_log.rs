// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NDJSON event log: the single source of truth for durable state.
//!
//! Each entry is one line of JSON (an [`Envelope`]). Appends are durable
//! before the call returns: the line is written and fsynced. Sequence
//! numbers start at 1 and increase by exactly 1; any gap, duplicate, or
//! unparseable line is treated as corruption and aborts startup;
//! corruption beats silent drift.

use relay_core::Envelope;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in event log operations
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Corrupt entry at line {line}: {message}")]
    Corrupt { line: usize, message: String },
    #[error("Sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },
}

/// Append-only NDJSON log of event envelopes.
#[derive(Debug)]
pub struct EventLog {
    file: File,
    path: PathBuf,
    last_seq: u64,
}

impl EventLog {
    /// Open or create the log, reading and validating every existing entry.
    ///
    /// Returns the log handle plus all entries in order. Validation is
    /// strict: sequence numbers must run 1, 2, 3, … with no gaps or
    /// duplicates.
    pub fn open(path: &Path) -> Result<(Self, Vec<Envelope>), EventLogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let entries = Self::read_entries(&file)?;
        let last_seq = entries.last().map(|e| e.seq).unwrap_or(0);

        debug!(
            path = %path.display(),
            entries = entries.len(),
            last_seq,
            "event log opened"
        );

        Ok((
            Self {
                file,
                path: path.to_owned(),
                last_seq,
            },
            entries,
        ))
    }

    fn read_entries(file: &File) -> Result<Vec<Envelope>, EventLogError> {
        let reader = BufReader::new(file.try_clone()?);
        let mut entries = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let envelope: Envelope =
                serde_json::from_str(trimmed).map_err(|e| EventLogError::Corrupt {
                    line: idx + 1,
                    message: e.to_string(),
                })?;

            let expected = entries.last().map(|e: &Envelope| e.seq + 1).unwrap_or(1);
            if envelope.seq != expected {
                return Err(EventLogError::SequenceGap {
                    expected,
                    found: envelope.seq,
                });
            }

            entries.push(envelope);
        }

        Ok(entries)
    }

    /// Append an envelope and make it durable before returning.
    ///
    /// The caller assigns `seq`; this only verifies monotonicity. Callers
    /// must serialize appends (a single writer).
    pub fn append(&mut self, envelope: &Envelope) -> Result<(), EventLogError> {
        if envelope.seq != self.last_seq + 1 {
            return Err(EventLogError::SequenceGap {
                expected: self.last_seq + 1,
                found: envelope.seq,
            });
        }

        let mut json_bytes = serde_json::to_vec(envelope)?;
        json_bytes.push(b'\n');
        self.file.write_all(&json_bytes)?;
        self.file.sync_data()?;

        self.last_seq = envelope.seq;
        Ok(())
    }

    /// Highest sequence number on disk.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
