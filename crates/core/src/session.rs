// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session record: one conversational context per chat thread.

use crate::job::JobId;
use crate::tool::Tool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

crate::define_id! {
    /// Opaque chat-thread identifier supplied by the chat surface.
    pub struct ThreadId;
}

crate::define_id! {
    /// Source message id of an enqueue request (dedup anchor).
    pub struct MessageId;
}

/// Dedup-index key for an enqueue request.
pub fn dedupe_key(thread_id: &ThreadId, message_id: &MessageId) -> String {
    format!("{}:{}", thread_id, message_id)
}

/// A conversational session bound 1:1 to a chat thread.
///
/// Invariants: at most one running job; every id in `queue` names a job in
/// state `queued`; `running_job_id` (if set) names a job in state `running`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub thread_id: ThreadId,
    pub project_name: String,
    /// Tool used for *future* enqueues; already-enqueued jobs keep theirs.
    pub tool: Tool,
    /// Tool-specific resume keys (`session_id` / `thread_id` namespaces).
    #[serde(default)]
    pub adapter_state: HashMap<String, String>,
    /// Pending job ids, strictly FIFO.
    #[serde(default)]
    pub queue: VecDeque<JobId>,
    pub running_job_id: Option<JobId>,
    pub last_job_id: Option<JobId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        thread_id: ThreadId,
        project_name: impl Into<String>,
        tool: Tool,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            thread_id,
            project_name: project_name.into(),
            tool,
            adapter_state: HashMap::new(),
            queue: VecDeque::new(),
            running_job_id: None,
            last_job_id: None,
            created_at: at,
            updated_at: at,
            last_activity_at: at,
        }
    }

    /// The resume key for the given tool, if one has been captured.
    ///
    /// Empty strings count as absent: a tool that once emitted an empty key
    /// must not be "resumed" with it.
    pub fn resume_key_for(&self, tool: Tool) -> Option<&str> {
        self.adapter_state
            .get(tool.resume_state_key())
            .map(String::as_str)
            .filter(|k| !k.is_empty())
    }

    /// True when this session can accept a job right now.
    pub fn idle(&self) -> bool {
        self.running_job_id.is_none()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
