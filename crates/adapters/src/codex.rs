// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter for the Codex CLI (`codex exec`).
//!
//! Dialect: item envelopes, `type:"item.started"` / `type:"item.completed"`
//! with a nested `item` whose own `type` distinguishes agent messages,
//! reasoning, and command executions. The resume key is a `thread_id`,
//! either from an explicit `thread.started` event or any event carrying
//! one (last observed wins).

use crate::adapter::{AdapterFailure, RunInput, RunReport, ToolAdapter};
use crate::process::{run_streaming, SpawnSpec};
use crate::progress::{emit_progress, ActivityKind, ProgressEvent, ProgressSink};
use crate::stream::{looks_like_json_object, top_level_str, TextAccumulator};
use async_trait::async_trait;
use relay_core::{ErrorCode, Tool};
use serde_json::Value;
use std::collections::HashMap;

/// Adapter for Codex.
#[derive(Debug, Clone)]
pub struct CodexAdapter {
    program: String,
}

impl Default for CodexAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodexAdapter {
    pub fn new() -> Self {
        Self {
            program: "codex".to_string(),
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
            "exec".to_string(),
            "--dangerously-bypass-approvals-and-sandbox".to_string(),
        ];
        if let Some(key) = &input.resume_key {
            args.push("resume".to_string());
            args.push(key.clone());
        }
        args.push("--json".to_string());
        args.extend(input.extra_args.iter().cloned());
        args.push(input.prompt.clone());
        args
    }
}

/// Activity label for a command execution.
///
/// Shell wrappers collapse to "bash"; otherwise the basename of the first
/// token; "tool" when the command string is empty.
fn command_label(command: &str) -> String {
    if command.contains("/bin/zsh") || command.contains("/bin/bash") {
        return "bash".to_string();
    }
    command
        .split_whitespace()
        .next()
        .map(|token| token.rsplit('/').next().unwrap_or(token).to_string())
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| "tool".to_string())
}

/// Live progress emission for one parsed event.
fn emit_live(value: &Value, sink: Option<&ProgressSink>) {
    if !matches!(
        top_level_str(value, "type"),
        Some("item.started") | Some("item.completed")
    ) {
        return;
    }
    let Some(item) = value.get("item") else {
        return;
    };
    match top_level_str(item, "type") {
        Some("agent_message") => {
            if let Some(text) = top_level_str(item, "text") {
                emit_progress(sink, ProgressEvent::text(text));
            }
        }
        Some("reasoning") => {
            emit_progress(
                sink,
                ProgressEvent::activity(ActivityKind::Thinking, "reasoning"),
            );
        }
        Some("command_execution") => {
            let label = command_label(top_level_str(item, "command").unwrap_or(""));
            emit_progress(sink, ProgressEvent::activity(ActivityKind::Tool, label));
        }
        _ => {}
    }
}

struct Collected {
    assistant_text: String,
    thread_id: Option<String>,
    /// Lines that parsed as dialect events.
    stdout_lines: Vec<String>,
    /// Everything else, verbatim. Disjoint from `stdout_lines`.
    diagnostics: Vec<String>,
}

/// Post-run pass: thread key + agent messages in document order.
fn collect(captured: &[String]) -> Collected {
    let mut acc = TextAccumulator::new();
    let mut thread_id: Option<String> = None;
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

        // Covers both {"type":"thread.started","thread_id":...} and any
        // other event carrying a thread_id.
        if let Some(tid) = top_level_str(&value, "thread_id") {
            thread_id = Some(tid.to_string());
        }

        if matches!(
            top_level_str(&value, "type"),
            Some("item.started") | Some("item.completed")
        ) {
            if let Some(item) = value.get("item") {
                if top_level_str(item, "type") == Some("agent_message") {
                    if let Some(text) = top_level_str(item, "text") {
                        acc.push(text);
                    }
                }
            }
        }
    }

    Collected {
        assistant_text: acc.join("\n"),
        thread_id,
        stdout_lines,
        diagnostics,
    }
}

#[async_trait]
impl ToolAdapter for CodexAdapter {
    fn tool(&self) -> Tool {
        Tool::Codex
    }

    async fn run(&self, input: RunInput) -> RunReport {
        let spec = SpawnSpec {
            program: self.program.clone(),
            args: self.build_args(&input),
            cwd: input.cwd.clone(),
            timeout: input.timeout,
        };

        let sink = input.on_progress.clone();
        let capture = match run_streaming(&spec, |line| {
            if looks_like_json_object(line) {
                if let Ok(value) = serde_json::from_str::<Value>(line.trim()) {
                    emit_live(&value, sink.as_ref());
                }
            }
        })
        .await
        {
            Ok(capture) => capture,
            Err(e) => {
                return RunReport {
                    error: Some(AdapterFailure::new(ErrorCode::CliExitNonzero, e.to_string())),
                    ..Default::default()
                }
            }
        };

        let collected = collect(&capture.stdout_lines);
        let mut adapter_state = HashMap::new();
        if let Some(tid) = &collected.thread_id {
            adapter_state.insert("thread_id".to_string(), tid.clone());
        }

        let error = if capture.timed_out {
            Some(AdapterFailure::new(
                ErrorCode::CliTimeout,
                format!("timed out after {}s", input.timeout.as_secs()),
            ))
        } else if !capture.success() {
            Some(AdapterFailure::new(
                ErrorCode::CliExitNonzero,
                match capture.exit_code() {
                    Some(code) => format!("exit code: {code}"),
                    None => "terminated by signal".to_string(),
                },
            ))
        } else if collected.thread_id.is_none() {
            Some(AdapterFailure::new(
                ErrorCode::AdapterSessionKeyMissing,
                "no thread_id observed in output stream",
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
#[path = "codex_tests.rs"]
mod tests;
