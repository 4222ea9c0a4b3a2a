// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event store: log + projection + snapshot policy + crash recovery.
//!
//! The store is the single writer. `append` assigns the next sequence
//! number, makes the envelope durable, and only then applies it to the
//! in-memory projection. Opening the store replays snapshot + tail and
//! transitions any job that was `running` at crash time to
//! `unknown_after_crash`.

use crate::event_log::{EventLog, EventLogError};
use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::RuntimeState;
use chrono::Utc;
use relay_core::constants::{SNAPSHOT_EVERY_EVENTS, SNAPSHOT_EVERY_SECONDS};
use relay_core::{Envelope, Event, JobId};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

const EVENTS_FILE: &str = "events.ndjson";
const SNAPSHOT_FILE: &str = "snapshot.json";

/// Errors from store operations. All of these are fatal to the engine;
/// a store that cannot write durably must not keep running.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Log(#[from] EventLogError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("Snapshot covers seq {snapshot_seq} but the event log ends at {log_seq}")]
    SnapshotAhead { snapshot_seq: u64, log_seq: u64 },
}

/// Durable event store with periodic snapshots.
#[derive(Debug)]
pub struct EventStore {
    log: EventLog,
    state: RuntimeState,
    snapshot_path: PathBuf,
    events_since_snapshot: u64,
    last_snapshot_at: Instant,
}

impl EventStore {
    /// Open the store under `state_dir`, replay, and run crash recovery.
    ///
    /// Returns the store plus the ids of jobs that were `running` at crash
    /// time and are now `unknown_after_crash`. Those jobs are never retried
    /// automatically; the owner must ask.
    pub fn open(state_dir: &Path) -> Result<(Self, Vec<JobId>), StoreError> {
        let snapshot_path = state_dir.join(SNAPSHOT_FILE);

        let mut state = match Snapshot::load(&snapshot_path)? {
            Some(snapshot) => {
                debug!(seq = snapshot.seq, "snapshot loaded");
                snapshot.into_state()
            }
            None => RuntimeState::default(),
        };

        let snapshot_seq = state.last_seq;
        let (log, entries) = EventLog::open(&state_dir.join(EVENTS_FILE))?;

        if log.last_seq() < snapshot_seq {
            return Err(StoreError::SnapshotAhead {
                snapshot_seq,
                log_seq: log.last_seq(),
            });
        }

        let mut replayed = 0u64;
        for envelope in &entries {
            if envelope.seq <= snapshot_seq {
                continue;
            }
            state.apply(envelope);
            replayed += 1;
        }

        info!(
            snapshot_seq,
            replayed,
            last_seq = state.last_seq,
            "state replayed"
        );

        let mut store = Self {
            log,
            state,
            snapshot_path,
            events_since_snapshot: 0,
            last_snapshot_at: Instant::now(),
        };

        let marked = store.recover_running_jobs()?;
        Ok((store, marked))
    }

    /// Crash recovery: every job still `running` after replay was in flight
    /// when the process died. Its outcome is unknown; record that fact.
    ///
    /// Idempotent: a second pass finds no running jobs and marks nothing.
    fn recover_running_jobs(&mut self) -> Result<Vec<JobId>, StoreError> {
        let mut marked = Vec::new();
        for job_id in self.state.running_job_ids() {
            let thread_id = match self.state.jobs.get(&job_id) {
                Some(job) => job.thread_id.clone(),
                None => continue,
            };
            info!(job_id = %job_id, thread_id = %thread_id, "marking in-flight job unknown after crash");
            self.append(Event::JobMarkedUnknownAfterCrash {
                thread_id,
                job_id: job_id.clone(),
            })?;
            marked.push(job_id);
        }
        Ok(marked)
    }

    /// Append an event: assign `seq`, write durably, apply, maybe snapshot.
    ///
    /// Returns the assigned sequence number. Callers must hold the single
    /// writer lock; this type is not internally synchronized.
    pub fn append(&mut self, event: Event) -> Result<u64, StoreError> {
        let envelope = Envelope::new(self.state.last_seq + 1, Utc::now(), event);
        self.log.append(&envelope)?;
        self.state.apply(&envelope);

        debug!(seq = envelope.seq, kind = envelope.event.kind(), "event appended");

        self.events_since_snapshot += 1;
        self.maybe_snapshot()?;

        Ok(envelope.seq)
    }

    /// Snapshot when enough events or enough time (with at least one event)
    /// has accumulated since the last one.
    fn maybe_snapshot(&mut self) -> Result<(), StoreError> {
        let by_count = self.events_since_snapshot >= SNAPSHOT_EVERY_EVENTS;
        let by_time = self.events_since_snapshot >= 1
            && self.last_snapshot_at.elapsed() >= Duration::from_secs(SNAPSHOT_EVERY_SECONDS);
        if by_count || by_time {
            self.write_snapshot()?;
        }
        Ok(())
    }

    /// Write a snapshot now, resetting the policy counters.
    pub fn write_snapshot(&mut self) -> Result<(), StoreError> {
        Snapshot::capture(&self.state).save(&self.snapshot_path)?;
        self.events_since_snapshot = 0;
        self.last_snapshot_at = Instant::now();
        Ok(())
    }

    /// Read-only view of the projection.
    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    /// Deep copy of the projection for hand-out to external callers.
    pub fn state_snapshot(&self) -> RuntimeState {
        self.state.clone()
    }

    /// Highest durable sequence number.
    pub fn last_seq(&self) -> u64 {
        self.state.last_seq
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
