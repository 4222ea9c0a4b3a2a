// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter for the Gemini CLI (`gemini`).
//!
//! Dialect: `type:"init"` carries the `session_id`; `type:"message"` with
//! `role:"assistant"` carries streamed text (preferring `delta`, falling
//! back to generic extraction); `type:"result"` with a string `status`
//! marks completion. A run without a result event did not complete, no
//! matter what the exit code says.
//!
//! This is the only adapter with an automatic retry: exactly one, on a
//! nonzero exit whose combined output looks like a transient provider
//! hiccup (quota / rate-limit wording).

use crate::adapter::{AdapterFailure, RunInput, RunReport, ToolAdapter};
use crate::process::{run_streaming, Capture, ProcessError, SpawnSpec};
use crate::progress::{emit_progress, ProgressEvent, ProgressSink};
use crate::stream::{extract_text, looks_like_json_object, top_level_str, TextAccumulator};
use async_trait::async_trait;
use relay_core::{ErrorCode, Tool};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

/// Lowercased substrings that mark a failure as worth one retry.
const TRANSIENT_HINTS: [&str; 5] = [
    "quota",
    "retry",
    "rate limit",
    "429",
    "temporarily unavailable",
];

/// Adapter for Gemini.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    program: String,
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self {
            program: "gemini".to_string(),
        }
    }

    /// Override the binary (tests point this at a stub).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_args(&self, input: &RunInput) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            input.prompt.clone(),
            "--output-format".to_string(),
            "stream-json".to_string(),
        ];
        if let Some(key) = &input.resume_key {
            args.push("--resume".to_string());
            args.push(key.clone());
        }
        args.extend(input.extra_args.iter().cloned());
        args
    }
}

/// Live progress emission for one parsed event.
fn emit_live(value: &Value, sink: Option<&ProgressSink>) {
    if top_level_str(value, "type") != Some("message")
        || top_level_str(value, "role") != Some("assistant")
    {
        return;
    }
    let text = match top_level_str(value, "delta") {
        Some(delta) => Some(delta.to_string()),
        None => extract_text(value),
    };
    if let Some(text) = text {
        emit_progress(sink, ProgressEvent::text(text));
    }
}

struct Collected {
    assistant_text: String,
    session_id: Option<String>,
    result_status: Option<String>,
    /// Lines that parsed as dialect events.
    stdout_lines: Vec<String>,
    /// Everything else, verbatim. Disjoint from `stdout_lines`.
    diagnostics: Vec<String>,
}

/// Post-run pass: session key, streamed text, completion status.
fn collect(captured: &[String]) -> Collected {
    let mut acc = TextAccumulator::new();
    let mut session_id: Option<String> = None;
    let mut result_status: Option<String> = None;
    let mut stdout_lines = Vec::new();
    let mut diagnostics = Vec::new();

    for line in captured {
        if !looks_like_json_object(line) {
            diagnostics.push(line.clone());
            continue;
        }
        let value: Value = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(_) => {
                diagnostics.push(line.clone());
                continue;
            }
        };
        stdout_lines.push(line.clone());

        match top_level_str(&value, "type") {
            Some("init") => {
                if let Some(sid) = top_level_str(&value, "session_id") {
                    session_id = Some(sid.to_string());
                }
            }
            Some("message") if top_level_str(&value, "role") == Some("assistant") => {
                let text = match top_level_str(&value, "delta") {
                    Some(delta) => Some(delta.to_string()),
                    None => extract_text(&value),
                };
                if let Some(text) = text {
                    acc.push(&text);
                }
            }
            Some("result") => {
                if let Some(status) = top_level_str(&value, "status") {
                    result_status = Some(status.to_string());
                }
            }
            _ => {}
        }
    }

    Collected {
        // Streamed deltas are fragments of one message; concatenate directly.
        assistant_text: acc.join(""),
        session_id,
        result_status,
        stdout_lines,
        diagnostics,
    }
}

/// Does the combined output read like a transient provider failure?
fn looks_transient(capture: &Capture) -> bool {
    let combined = capture
        .stdout_lines
        .iter()
        .chain(capture.stderr_lines.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();
    TRANSIENT_HINTS.iter().any(|hint| combined.contains(hint))
}

enum Attempt {
    Captured(Capture),
    SpawnFailed(ProcessError),
}

impl GeminiAdapter {
    async fn attempt(&self, input: &RunInput) -> Attempt {
        let spec = SpawnSpec {
            program: self.program.clone(),
            args: self.build_args(input),
            cwd: input.cwd.clone(),
            timeout: input.timeout,
        };
        let sink = input.on_progress.clone();
        match run_streaming(&spec, |line| {
            if looks_like_json_object(line) {
                if let Ok(value) = serde_json::from_str::<Value>(line.trim()) {
                    emit_live(&value, sink.as_ref());
                }
            }
        })
        .await
        {
            Ok(capture) => Attempt::Captured(capture),
            Err(e) => Attempt::SpawnFailed(e),
        }
    }
}

#[async_trait]
impl ToolAdapter for GeminiAdapter {
    fn tool(&self) -> Tool {
        Tool::Gemini
    }

    async fn run(&self, input: RunInput) -> RunReport {
        let mut capture = match self.attempt(&input).await {
            Attempt::Captured(capture) => capture,
            Attempt::SpawnFailed(e) => {
                return RunReport {
                    error: Some(AdapterFailure::new(ErrorCode::CliExitNonzero, e.to_string())),
                    ..Default::default()
                }
            }
        };

        // One retry, from scratch with the same argv, on a transient-looking
        // nonzero exit. The retry count is not user-visible.
        if !capture.timed_out && !capture.success() && looks_transient(&capture) {
            info!(tool = %self.tool(), "transient failure hint; retrying once");
            capture = match self.attempt(&input).await {
                Attempt::Captured(second) => second,
                Attempt::SpawnFailed(e) => {
                    return RunReport {
                        error: Some(AdapterFailure::new(ErrorCode::CliExitNonzero, e.to_string())),
                        ..Default::default()
                    }
                }
            };
        }

        let collected = collect(&capture.stdout_lines);
        let mut adapter_state = HashMap::new();
        if let Some(sid) = &collected.session_id {
            adapter_state.insert("session_id".to_string(), sid.clone());
        }

        let error = if capture.timed_out {
            Some(AdapterFailure::new(
                ErrorCode::CliTimeout,
                format!("timed out after {}s", input.timeout.as_secs()),
            ))
        } else if collected.result_status.is_none() {
            // A run without a result event did not complete, whatever the
            // exit code claims.
            Some(AdapterFailure::new(
                ErrorCode::AdapterMissingResult,
                "stream ended without a result event",
            ))
        } else if !capture.success() {
            Some(AdapterFailure::new(
                ErrorCode::CliExitNonzero,
                match capture.exit_code() {
                    Some(code) => format!("exit code: {code}"),
                    None => "terminated by signal".to_string(),
                },
            ))
        } else if collected.result_status.as_deref() != Some("success") {
            Some(AdapterFailure::new(
                ErrorCode::CliExitNonzero,
                format!(
                    "result status: {}",
                    collected.result_status.as_deref().unwrap_or("unknown")
                ),
            ))
        } else if collected.session_id.is_none() {
            Some(AdapterFailure::new(
                ErrorCode::AdapterSessionKeyMissing,
                "no session_id observed in output stream",
            ))
        } else {
            None
        };

        RunReport {
            ok: error.is_none(),
            assistant_text: collected.assistant_text,
            adapter_state,
            diagnostic_logs: collected.diagnostics,
            stdout_lines: collected.stdout_lines,
            stderr_lines: capture.stderr_lines,
            error,
        }
    }
}

#[cfg(test)]
#[path = "gemini_tests.rs"]
mod tests;
