// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and state machine.
//!
//! A job is one enqueued prompt plus its execution outcome. Jobs move one
//! way through the state machine and are never mutated retroactively; a
//! retry creates a fresh job with `attempt + 1`.

use crate::constants::MAX_RESULT_EXCERPT_CHARS;
use crate::error::ErrorCode;
use crate::session::{MessageId, ThreadId};
use crate::tool::Tool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a job.
    pub struct JobId;
}

/// Job lifecycle state.
///
/// ```text
/// queued ──▶ running ──▶ success
///                 ╰─────▶ failed
///                 ╰─────▶ unknown_after_crash   (crash recovery only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Success,
    Failed,
    UnknownAfterCrash,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Success | JobState::Failed | JobState::UnknownAfterCrash
        )
    }

    /// Only failed and crash-orphaned jobs may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobState::Failed | JobState::UnknownAfterCrash)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Running => write!(f, "running"),
            JobState::Success => write!(f, "success"),
            JobState::Failed => write!(f, "failed"),
            JobState::UnknownAfterCrash => write!(f, "unknown_after_crash"),
        }
    }
}

/// One enqueued prompt and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub thread_id: ThreadId,
    /// Source message that enqueued this job. Retries use the synthetic
    /// `retry:<old_job>:<new_job>` form to keep the dedup key unique.
    pub discord_message_id: MessageId,
    pub state: JobState,
    pub prompt: String,
    /// Frozen at enqueue; a later tool switch does not touch this job.
    pub tool: Tool,
    /// 1 for the original enqueue, incremented by each retry.
    pub attempt: u32,
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// First characters of the final assistant text.
    pub result_excerpt: Option<String>,
}

impl Job {
    pub fn new(
        job_id: JobId,
        thread_id: ThreadId,
        discord_message_id: MessageId,
        prompt: impl Into<String>,
        tool: Tool,
        attempt: u32,
    ) -> Self {
        Self {
            job_id,
            thread_id,
            discord_message_id,
            state: JobState::Queued,
            prompt: prompt.into(),
            tool,
            attempt,
            error_code: None,
            error_message: None,
            started_at: None,
            finished_at: None,
            result_excerpt: None,
        }
    }
}

/// Truncate assistant text to the stored excerpt length, on a char boundary.
pub fn excerpt(text: &str) -> String {
    text.chars().take(MAX_RESULT_EXCERPT_CHARS).collect()
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
