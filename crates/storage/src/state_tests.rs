// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use relay_core::test_support::{
    job_completed_with, job_enqueued, job_failed, job_started, session_created, state_entry,
};
use relay_core::{ErrorCode, Event, Tool};

fn apply_all(state: &mut RuntimeState, events: Vec<Event>) {
    for event in events {
        let seq = state.last_seq + 1;
        state.apply(&Envelope::new(seq, Utc::now(), event));
    }
}

// ── Session lifecycle ────────────────────────────────────────────────────────

#[test]
fn session_created_inserts_session() {
    let mut state = RuntimeState::default();
    apply_all(&mut state, vec![session_created("t-1", "proj", Tool::Claude)]);

    let session = &state.sessions[&ThreadId::new("t-1")];
    assert_eq!(session.project_name, "proj");
    assert_eq!(session.tool, Tool::Claude);
    assert!(session.queue.is_empty());
    assert!(session.running_job_id.is_none());
}

#[test]
fn tool_changed_updates_future_tool_only() {
    let mut state = RuntimeState::default();
    apply_all(
        &mut state,
        vec![
            session_created("t-1", "proj", Tool::Claude),
            job_enqueued("t-1", "j-1", "m-1", "p"),
            Event::ToolChanged {
                thread_id: ThreadId::new("t-1"),
                tool: Tool::Codex,
            },
        ],
    );

    assert_eq!(state.sessions[&ThreadId::new("t-1")].tool, Tool::Codex);
    // The already-enqueued job keeps its frozen tool.
    assert_eq!(state.jobs[&JobId::new("j-1")].tool, Tool::Claude);
}

// ── Job lifecycle ────────────────────────────────────────────────────────────

#[test]
fn enqueue_creates_job_and_queues_it() {
    let mut state = RuntimeState::default();
    apply_all(
        &mut state,
        vec![
            session_created("t-1", "proj", Tool::Claude),
            job_enqueued("t-1", "j-1", "m-1", "build it"),
        ],
    );

    let job = &state.jobs[&JobId::new("j-1")];
    assert_eq!(job.state, JobState::Queued);
    assert_eq!(job.prompt, "build it");
    assert_eq!(job.attempt, 1);

    let session = &state.sessions[&ThreadId::new("t-1")];
    assert_eq!(session.queue, [JobId::new("j-1")]);
    assert_eq!(state.dedupe["t-1:m-1"], "j-1");
}

#[test]
fn started_moves_job_from_queue_to_running() {
    let mut state = RuntimeState::default();
    apply_all(
        &mut state,
        vec![
            session_created("t-1", "proj", Tool::Claude),
            job_enqueued("t-1", "j-1", "m-1", "p"),
            job_started("t-1", "j-1"),
        ],
    );

    let job = &state.jobs[&JobId::new("j-1")];
    assert_eq!(job.state, JobState::Running);
    assert!(job.started_at.is_some());

    let session = &state.sessions[&ThreadId::new("t-1")];
    assert!(session.queue.is_empty());
    assert_eq!(session.running_job_id, Some(JobId::new("j-1")));
}

#[test]
fn completed_stores_excerpt_and_merges_adapter_state() {
    let mut state = RuntimeState::default();
    apply_all(
        &mut state,
        vec![
            session_created("t-1", "proj", Tool::Claude),
            job_enqueued("t-1", "j-1", "m-1", "p"),
            job_started("t-1", "j-1"),
            job_completed_with("t-1", "j-1", "done", state_entry("session_id", "sk-7")),
        ],
    );

    let job = &state.jobs[&JobId::new("j-1")];
    assert_eq!(job.state, JobState::Success);
    assert_eq!(job.result_excerpt.as_deref(), Some("done"));
    assert!(job.finished_at.unwrap() >= job.started_at.unwrap());

    let session = &state.sessions[&ThreadId::new("t-1")];
    assert!(session.running_job_id.is_none());
    assert_eq!(session.last_job_id, Some(JobId::new("j-1")));
    assert_eq!(session.adapter_state["session_id"], "sk-7");
}

#[test]
fn failed_stores_code_and_message() {
    let mut state = RuntimeState::default();
    apply_all(
        &mut state,
        vec![
            session_created("t-1", "proj", Tool::Claude),
            job_enqueued("t-1", "j-1", "m-1", "p"),
            job_started("t-1", "j-1"),
            job_failed("t-1", "j-1", ErrorCode::CliTimeout, "timed out after 900s"),
        ],
    );

    let job = &state.jobs[&JobId::new("j-1")];
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.error_code, Some(ErrorCode::CliTimeout));
    assert_eq!(job.error_message.as_deref(), Some("timed out after 900s"));
    assert!(state.sessions[&ThreadId::new("t-1")]
        .running_job_id
        .is_none());
}

#[test]
fn crash_mark_clears_running_without_finishing() {
    let mut state = RuntimeState::default();
    apply_all(
        &mut state,
        vec![
            session_created("t-1", "proj", Tool::Claude),
            job_enqueued("t-1", "j-1", "m-1", "p"),
            job_started("t-1", "j-1"),
            Event::JobMarkedUnknownAfterCrash {
                thread_id: ThreadId::new("t-1"),
                job_id: JobId::new("j-1"),
            },
        ],
    );

    let job = &state.jobs[&JobId::new("j-1")];
    assert_eq!(job.state, JobState::UnknownAfterCrash);
    assert!(job.finished_at.is_none());
    let session = &state.sessions[&ThreadId::new("t-1")];
    assert!(session.running_job_id.is_none());
    assert_eq!(session.last_job_id, Some(JobId::new("j-1")));
}

// ── Idempotency ──────────────────────────────────────────────────────────────

#[test]
fn reapplying_enqueue_does_not_duplicate_queue_entry() {
    let mut state = RuntimeState::default();
    apply_all(&mut state, vec![session_created("t-1", "proj", Tool::Claude)]);

    let event = job_enqueued("t-1", "j-1", "m-1", "p");
    state.apply(&Envelope::new(2, Utc::now(), event.clone()));
    state.apply(&Envelope::new(3, Utc::now(), event));

    assert_eq!(state.sessions[&ThreadId::new("t-1")].queue.len(), 1);
    assert_eq!(state.jobs.len(), 1);
    assert_eq!(state.dedupe.len(), 1);
}

// ── Queries ──────────────────────────────────────────────────────────────────

#[test]
fn find_job_matches_exact_and_unique_prefix() {
    let mut state = RuntimeState::default();
    apply_all(
        &mut state,
        vec![
            session_created("t-1", "proj", Tool::Claude),
            job_enqueued("t-1", "abc-111", "m-1", "p1"),
            job_enqueued("t-1", "abd-222", "m-2", "p2"),
        ],
    );

    assert_eq!(state.find_job("abc-111").unwrap().prompt, "p1");
    assert_eq!(state.find_job("abd").unwrap().prompt, "p2");
    // Ambiguous prefix
    assert!(state.find_job("ab").is_none());
    assert!(state.find_job("zzz").is_none());
}

#[test]
fn idle_reflects_queues_and_running() {
    let mut state = RuntimeState::default();
    assert!(state.is_idle());

    apply_all(
        &mut state,
        vec![
            session_created("t-1", "proj", Tool::Claude),
            job_enqueued("t-1", "j-1", "m-1", "p"),
        ],
    );
    assert!(!state.is_idle());

    apply_all(&mut state, vec![job_started("t-1", "j-1")]);
    assert!(!state.is_idle());
    assert_eq!(state.running_count(), 1);

    apply_all(
        &mut state,
        vec![job_completed_with("t-1", "j-1", "ok", Default::default())],
    );
    assert!(state.is_idle());
}
