// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable event vocabulary.
//!
//! Events are facts about what happened; all state is derived from them.
//! One envelope per line in `events.ndjson`:
//! `{"seq":N,"ts":"...","type":"JobEnqueued","payload":{...}}`

use crate::error::ErrorCode;
use crate::job::JobId;
use crate::session::{MessageId, ThreadId};
use crate::tool::Tool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Events that drive every state transition in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Audit record; project configuration itself lives in `config.json`.
    ProjectCreated {
        project_name: String,
        path: PathBuf,
        enabled_tools: Vec<Tool>,
    },

    SessionCreated {
        thread_id: ThreadId,
        project_name: String,
        tool: Tool,
        #[serde(default)]
        adapter_state: HashMap<String, String>,
    },

    /// Applies to future enqueues only; queued and running jobs keep the
    /// tool frozen at their enqueue.
    ToolChanged { thread_id: ThreadId, tool: Tool },

    JobEnqueued {
        thread_id: ThreadId,
        job_id: JobId,
        discord_message_id: MessageId,
        prompt: String,
        tool: Tool,
        attempt: u32,
    },

    JobStarted { thread_id: ThreadId, job_id: JobId },

    JobCompleted {
        thread_id: ThreadId,
        job_id: JobId,
        result_excerpt: String,
        #[serde(default)]
        adapter_state: HashMap<String, String>,
    },

    JobFailed {
        thread_id: ThreadId,
        job_id: JobId,
        error_code: ErrorCode,
        error_message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        adapter_state: Option<HashMap<String, String>>,
    },

    /// Written by crash recovery for jobs that were running when the
    /// process died. Never `failed`, never `success`: the outcome is
    /// genuinely unknown.
    JobMarkedUnknownAfterCrash { thread_id: ThreadId, job_id: JobId },
}

impl Event {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ProjectCreated { .. } => "ProjectCreated",
            Event::SessionCreated { .. } => "SessionCreated",
            Event::ToolChanged { .. } => "ToolChanged",
            Event::JobEnqueued { .. } => "JobEnqueued",
            Event::JobStarted { .. } => "JobStarted",
            Event::JobCompleted { .. } => "JobCompleted",
            Event::JobFailed { .. } => "JobFailed",
            Event::JobMarkedUnknownAfterCrash { .. } => "JobMarkedUnknownAfterCrash",
        }
    }
}

/// Envelope written to the event log.
///
/// `seq` starts at 1 and increases by exactly 1 per event, no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl Envelope {
    pub fn new(seq: u64, ts: DateTime<Utc>, event: Event) -> Self {
        Self { seq, ts, event }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
