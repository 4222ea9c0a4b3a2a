// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, Utc};
use relay_core::test_support::{job_enqueued, job_started, session_created};
use relay_core::{Envelope, Event, Tool};

/// Apply events with controlled timestamps: each step advances one second.
fn build_state(events: Vec<Event>) -> RuntimeState {
    let mut state = RuntimeState::default();
    let base = Utc::now();
    for (i, event) in events.into_iter().enumerate() {
        let ts = base + Duration::seconds(i as i64);
        state.apply(&Envelope::new(state.last_seq + 1, ts, event));
    }
    state
}

#[test]
fn empty_state_has_no_runnable_work() {
    assert_eq!(next_runnable(&RuntimeState::default()), None);
}

#[test]
fn picks_head_of_a_single_queue() {
    let state = build_state(vec![
        session_created("t-1", "p", Tool::Claude),
        job_enqueued("t-1", "j-1", "m-1", "first"),
        job_enqueued("t-1", "j-2", "m-2", "second"),
    ]);

    assert_eq!(
        next_runnable(&state),
        Some((ThreadId::new("t-1"), JobId::new("j-1")))
    );
}

#[test]
fn skips_threads_with_a_running_job() {
    let state = build_state(vec![
        session_created("t-1", "p", Tool::Claude),
        job_enqueued("t-1", "j-1", "m-1", "a"),
        job_enqueued("t-1", "j-2", "m-2", "b"),
        job_started("t-1", "j-1"),
    ]);

    // t-1 is busy; j-2 must wait even though the global cap has room.
    assert_eq!(next_runnable(&state), None);
}

#[test]
fn oldest_last_activity_goes_first() {
    let state = build_state(vec![
        session_created("t-old", "p", Tool::Claude),
        session_created("t-new", "p", Tool::Claude),
        job_enqueued("t-old", "j-1", "m-1", "a"),
        job_enqueued("t-new", "j-2", "m-2", "b"),
    ]);

    assert_eq!(
        next_runnable(&state),
        Some((ThreadId::new("t-old"), JobId::new("j-1")))
    );
}

#[test]
fn ties_break_on_smaller_thread_id() {
    // Same enqueue timestamp for both threads.
    let mut state = RuntimeState::default();
    let ts = Utc::now();
    for (i, event) in [
        session_created("t-b", "p", Tool::Claude),
        session_created("t-a", "p", Tool::Claude),
    ]
    .into_iter()
    .enumerate()
    {
        state.apply(&Envelope::new(i as u64 + 1, ts, event));
    }
    state.apply(&Envelope::new(3, ts, job_enqueued("t-b", "j-b", "m-1", "x")));
    state.apply(&Envelope::new(4, ts, job_enqueued("t-a", "j-a", "m-2", "y")));

    assert_eq!(
        next_runnable(&state),
        Some((ThreadId::new("t-a"), JobId::new("j-a")))
    );
}

#[test]
fn global_cap_blocks_a_third_admission() {
    let state = build_state(vec![
        session_created("t-1", "p", Tool::Claude),
        session_created("t-2", "p", Tool::Claude),
        session_created("t-3", "p", Tool::Claude),
        job_enqueued("t-1", "j-1", "m-1", "a"),
        job_enqueued("t-2", "j-2", "m-2", "b"),
        job_enqueued("t-3", "j-3", "m-3", "c"),
        job_started("t-1", "j-1"),
        job_started("t-2", "j-2"),
    ]);

    assert_eq!(state.running_count(), 2);
    assert_eq!(next_runnable(&state), None);
}
