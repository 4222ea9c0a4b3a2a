// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared builders for other crates' tests.
#![cfg_attr(coverage_nightly, coverage(off))]
#![allow(clippy::unwrap_used)]

use crate::event::Event;
use crate::job::JobId;
use crate::project::ProjectConfig;
use crate::session::{MessageId, ThreadId};
use crate::tool::Tool;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;

pub fn sample_project(name: &str, path: &str) -> ProjectConfig {
    let now = Utc::now();
    ProjectConfig {
        name: name.to_string(),
        path: PathBuf::from(path),
        enabled_tools: vec![Tool::Claude, Tool::Codex],
        default_tool: Tool::Claude,
        default_args: HashMap::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn session_created(thread_id: &str, project: &str, tool: Tool) -> Event {
    Event::SessionCreated {
        thread_id: ThreadId::new(thread_id),
        project_name: project.to_string(),
        tool,
        adapter_state: HashMap::new(),
    }
}

pub fn job_enqueued(thread_id: &str, job_id: &str, message_id: &str, prompt: &str) -> Event {
    job_enqueued_with(thread_id, job_id, message_id, prompt, Tool::Claude, 1)
}

pub fn job_enqueued_with(
    thread_id: &str,
    job_id: &str,
    message_id: &str,
    prompt: &str,
    tool: Tool,
    attempt: u32,
) -> Event {
    Event::JobEnqueued {
        thread_id: ThreadId::new(thread_id),
        job_id: JobId::new(job_id),
        discord_message_id: MessageId::new(message_id),
        prompt: prompt.to_string(),
        tool,
        attempt,
    }
}

pub fn job_started(thread_id: &str, job_id: &str) -> Event {
    Event::JobStarted {
        thread_id: ThreadId::new(thread_id),
        job_id: JobId::new(job_id),
    }
}

pub fn job_completed(thread_id: &str, job_id: &str, excerpt: &str) -> Event {
    job_completed_with(thread_id, job_id, excerpt, HashMap::new())
}

pub fn job_completed_with(
    thread_id: &str,
    job_id: &str,
    excerpt: &str,
    adapter_state: HashMap<String, String>,
) -> Event {
    Event::JobCompleted {
        thread_id: ThreadId::new(thread_id),
        job_id: JobId::new(job_id),
        result_excerpt: excerpt.to_string(),
        adapter_state,
    }
}

pub fn job_failed(thread_id: &str, job_id: &str, code: crate::ErrorCode, message: &str) -> Event {
    Event::JobFailed {
        thread_id: ThreadId::new(thread_id),
        job_id: JobId::new(job_id),
        error_code: code,
        error_message: message.to_string(),
        adapter_state: None,
    }
}

/// One-entry adapter-state map, for completion events.
pub fn state_entry(key: &str, value: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert(key.to_string(), value.to_string());
    map
}
