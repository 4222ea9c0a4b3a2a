// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The common adapter contract and the static tool → adapter dispatch set.

use crate::claude::ClaudeAdapter;
use crate::codex::CodexAdapter;
use crate::gemini::GeminiAdapter;
use crate::progress::ProgressSink;
use async_trait::async_trait;
use relay_core::{ErrorCode, Tool};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One invocation of a tool.
pub struct RunInput {
    pub prompt: String,
    /// Working directory: the project's absolute path.
    pub cwd: PathBuf,
    pub timeout: Duration,
    /// Continuation key from a prior run, when the session has one.
    pub resume_key: Option<String>,
    /// Project-configured argv passed verbatim to the tool.
    pub extra_args: Vec<String>,
    pub on_progress: Option<ProgressSink>,
}

impl RunInput {
    pub fn new(prompt: impl Into<String>, cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            cwd: cwd.into(),
            timeout,
            resume_key: None,
            extra_args: Vec::new(),
            on_progress: None,
        }
    }
}

/// Stable-coded failure from a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl AdapterFailure {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Everything a run produced, success or not.
///
/// Captured output is always present so the coordinator can write the job
/// log even for failed runs, and `adapter_state` carries any session key the
/// stream revealed before things went wrong.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub ok: bool,
    pub assistant_text: String,
    pub adapter_state: HashMap<String, String>,
    /// Non-JSON lines interleaved with the event stream. Not errors.
    pub diagnostic_logs: Vec<String>,
    /// Structured stdout lines. Disjoint from `diagnostic_logs`, so each
    /// captured line appears in the job log exactly once.
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
    pub error: Option<AdapterFailure>,
}

impl RunReport {
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// A tool adapter: spawn, stream-parse, classify.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Which tool this adapter drives.
    fn tool(&self) -> Tool;

    /// Run one prompt to completion. Never panics; every failure mode is a
    /// report with a stable error code.
    async fn run(&self, input: RunInput) -> RunReport;
}

/// Static tool → adapter mapping.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<Tool, Arc<dyn ToolAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The production set: one adapter per supported tool, each invoking
    /// the tool's binary by its conventional name.
    pub fn production() -> Self {
        Self::new()
            .with(Arc::new(ClaudeAdapter::new()))
            .with(Arc::new(CodexAdapter::new()))
            .with(Arc::new(GeminiAdapter::new()))
    }

    pub fn with(mut self, adapter: Arc<dyn ToolAdapter>) -> Self {
        self.adapters.insert(adapter.tool(), adapter);
        self
    }

    pub fn get(&self, tool: Tool) -> Option<Arc<dyn ToolAdapter>> {
        self.adapters.get(&tool).cloned()
    }
}
