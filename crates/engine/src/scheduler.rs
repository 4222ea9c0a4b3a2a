// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pick-next policy over the materialized state.
//!
//! Per-thread FIFO: a thread's jobs run strictly in enqueue order, one at a
//! time. Across threads, the oldest `last_activity_at` goes first (simple
//! fairness), tie-broken on the smaller thread id for determinism. Nothing
//! is admitted while `GLOBAL_MAX_RUNNING` jobs are in flight.

use relay_core::constants::GLOBAL_MAX_RUNNING;
use relay_core::{JobId, ThreadId};
use relay_storage::RuntimeState;

/// The next (thread, job) to admit, or `None` when the cap is reached or no
/// thread has runnable work.
pub fn next_runnable(state: &RuntimeState) -> Option<(ThreadId, JobId)> {
    if state.running_count() >= GLOBAL_MAX_RUNNING {
        return None;
    }

    state
        .sessions
        .values()
        .filter(|s| s.running_job_id.is_none() && !s.queue.is_empty())
        .min_by(|a, b| {
            a.last_activity_at
                .cmp(&b.last_activity_at)
                .then_with(|| a.thread_id.cmp(&b.thread_id))
        })
        .and_then(|session| {
            session
                .queue
                .front()
                .map(|job_id| (session.thread_id.clone(), job_id.clone()))
        })
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
