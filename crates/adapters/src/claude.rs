// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter for the Claude Code CLI (`claude`).
//!
//! Dialect: one JSON object per stdout line with a top-level `type`.
//! Assistant turns arrive as `type:"assistant"` with a `message.content[]`
//! block list; the final consolidated answer arrives as `type:"result"`
//! with a string `result`. The resume key is a top-level `session_id`
//! observed on any line (last one wins).

use crate::adapter::{AdapterFailure, RunInput, RunReport, ToolAdapter};
use crate::process::{run_streaming, SpawnSpec};
use crate::progress::{emit_progress, ActivityKind, ProgressEvent, ProgressSink};
use crate::stream::{looks_like_json_object, top_level_str, TextAccumulator};
use async_trait::async_trait;
use relay_core::{ErrorCode, Tool};
use serde_json::Value;
use std::collections::HashMap;

/// Adapter for Claude Code.
#[derive(Debug, Clone)]
pub struct ClaudeAdapter {
    program: String,
}

impl Default for ClaudeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaudeAdapter {
    pub fn new() -> Self {
        Self {
            program: "claude".to_string(),
        }
    }

    /// Override the binary (tests point this at a stub).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_args(&self, input: &RunInput) -> Vec<String> {
        let mut args: Vec<String> = [
            "-p",
            "--dangerously-skip-permissions",
            "--verbose",
            "--output-format",
            "stream-json",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.extend(input.extra_args.iter().cloned());
        if let Some(key) = &input.resume_key {
            args.push("-r".to_string());
            args.push(key.clone());
        }
        args.push(input.prompt.clone());
        args
    }
}

/// Live progress emission for one parsed event.
fn emit_live(value: &Value, sink: Option<&ProgressSink>) {
    if top_level_str(value, "type") != Some("assistant") {
        return;
    }
    let Some(blocks) = value
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)
    else {
        return;
    };
    for block in blocks {
        match top_level_str(block, "type") {
            Some("text") => {
                if let Some(text) = top_level_str(block, "text") {
                    emit_progress(sink, ProgressEvent::text(text));
                }
            }
            Some("tool_use") => {
                let label = top_level_str(block, "name").unwrap_or("tool");
                emit_progress(sink, ProgressEvent::activity(ActivityKind::Tool, label));
            }
            Some("thinking") => {
                emit_progress(
                    sink,
                    ProgressEvent::activity(ActivityKind::Thinking, "thinking"),
                );
            }
            _ => {}
        }
    }
}

struct Collected {
    assistant_text: String,
    session_id: Option<String>,
    /// Lines that parsed as dialect events.
    stdout_lines: Vec<String>,
    /// Everything else, verbatim. Disjoint from `stdout_lines`.
    diagnostics: Vec<String>,
}

/// Post-run pass: session key + assistant text in document order.
fn collect(captured: &[String]) -> Collected {
    let mut acc = TextAccumulator::new();
    let mut final_result: Option<String> = None;
    let mut session_id: Option<String> = None;
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

        if let Some(sid) = top_level_str(&value, "session_id") {
            session_id = Some(sid.to_string());
        }

        match top_level_str(&value, "type") {
            Some("assistant") => {
                if let Some(blocks) = value
                    .get("message")
                    .and_then(|m| m.get("content"))
                    .and_then(Value::as_array)
                {
                    for block in blocks {
                        if top_level_str(block, "type") == Some("text") {
                            if let Some(text) = top_level_str(block, "text") {
                                acc.push(text);
                            }
                        }
                    }
                }
            }
            Some("result") => {
                if let Some(result) = top_level_str(&value, "result") {
                    final_result = Some(result.to_string());
                }
            }
            _ => {}
        }
    }

    Collected {
        assistant_text: final_result.unwrap_or_else(|| acc.join("\n")),
        session_id,
        stdout_lines,
        diagnostics,
    }
}

#[async_trait]
impl ToolAdapter for ClaudeAdapter {
    fn tool(&self) -> Tool {
        Tool::Claude
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
        if let Some(sid) = &collected.session_id {
            adapter_state.insert("session_id".to_string(), sid.clone());
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
#[path = "claude_tests.rs"]
mod tests;
