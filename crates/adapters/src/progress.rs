// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming progress events emitted while a tool runs.

use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Introspective signal kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Thinking,
    Tool,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::Thinking => write!(f, "thinking"),
            ActivityKind::Tool => write!(f, "tool"),
        }
    }
}

/// One progress callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A visible assistant message fragment.
    AssistantText { text: String },
    /// What the tool is doing right now (thinking, running a command, …).
    Activity { kind: ActivityKind, label: String },
}

impl ProgressEvent {
    pub fn text(text: impl Into<String>) -> Self {
        ProgressEvent::AssistantText { text: text.into() }
    }

    pub fn activity(kind: ActivityKind, label: impl Into<String>) -> Self {
        ProgressEvent::Activity {
            kind,
            label: label.into(),
        }
    }
}

/// Synchronous, best-effort progress callback. A sink error must never
/// abort the run; [`emit_progress`] logs and swallows it.
pub type ProgressSink = Arc<dyn Fn(&ProgressEvent) -> Result<(), String> + Send + Sync>;

/// Deliver one event to an optional sink.
pub fn emit_progress(sink: Option<&ProgressSink>, event: ProgressEvent) {
    if let Some(sink) = sink {
        if let Err(error) = sink(&event) {
            warn!(error, "progress sink failed; continuing run");
        }
    }
}
