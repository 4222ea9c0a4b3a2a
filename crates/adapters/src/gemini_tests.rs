// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn input(prompt: &str, cwd: &Path) -> RunInput {
    RunInput::new(prompt, cwd, Duration::from_secs(5))
}

fn stub_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("fake-gemini");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[test]
fn argv_appends_resume_flag() {
    let adapter = GeminiAdapter::new();
    let mut run_input = input("summarize", Path::new("/tmp"));
    run_input.resume_key = Some("gs-1".to_string());
    assert_eq!(
        adapter.build_args(&run_input),
        [
            "-p",
            "summarize",
            "--output-format",
            "stream-json",
            "--resume",
            "gs-1",
        ]
    );
}

#[test]
fn collect_concatenates_deltas_without_separator() {
    let lines: Vec<String> = [
        r#"{"type":"init","session_id":"gs-7"}"#,
        r#"{"type":"message","role":"assistant","delta":"Hel"}"#,
        r#"{"type":"message","role":"assistant","delta":"lo"}"#,
        r#"{"type":"result","status":"success"}"#,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let collected = collect(&lines);
    assert_eq!(collected.assistant_text, "Hello");
    assert_eq!(collected.session_id.as_deref(), Some("gs-7"));
    assert_eq!(collected.result_status.as_deref(), Some("success"));
}

#[test]
fn collect_falls_back_to_generic_extraction() {
    let lines: Vec<String> = [
        r#"{"type":"message","role":"assistant","content":"whole message"}"#,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    assert_eq!(collect(&lines).assistant_text, "whole message");
}

#[test]
fn collect_ignores_non_assistant_messages() {
    let lines: Vec<String> = [r#"{"type":"message","role":"user","delta":"ignored"}"#]
        .iter()
        .map(|s| s.to_string())
        .collect();

    assert!(collect(&lines).assistant_text.is_empty());
}

#[tokio::test]
async fn missing_result_event_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let program = stub_tool(
        dir.path(),
        r#"printf '%s\n' '{"type":"init","session_id":"gs-1"}'"#,
    );

    let adapter = GeminiAdapter::with_program(program.display().to_string());
    let report = adapter.run(input("go", dir.path())).await;

    assert_eq!(
        report.error_code(),
        Some(relay_core::ErrorCode::AdapterMissingResult)
    );
}

#[tokio::test]
async fn missing_result_outranks_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    // Dies mid-stream: nonzero exit AND no result event. The incomplete
    // stream is the more precise diagnosis.
    let program = stub_tool(
        dir.path(),
        concat!(
            r#"printf '%s\n' '{"type":"init","session_id":"gs-1"}'"#,
            "\n",
            "exit 3\n",
        ),
    );

    let adapter = GeminiAdapter::with_program(program.display().to_string());
    let report = adapter.run(input("go", dir.path())).await;

    assert_eq!(
        report.error_code(),
        Some(relay_core::ErrorCode::AdapterMissingResult)
    );
}

#[tokio::test]
async fn non_success_status_maps_to_exit_error() {
    let dir = tempfile::tempdir().unwrap();
    let program = stub_tool(
        dir.path(),
        concat!(
            r#"printf '%s\n' '{"type":"init","session_id":"gs-1"}'"#,
            "\n",
            r#"printf '%s\n' '{"type":"result","status":"aborted"}'"#,
        ),
    );

    let adapter = GeminiAdapter::with_program(program.display().to_string());
    let report = adapter.run(input("go", dir.path())).await;

    assert!(!report.ok);
    let failure = report.error.unwrap();
    assert_eq!(failure.code, relay_core::ErrorCode::CliExitNonzero);
    assert!(failure.message.contains("aborted"));
}

#[tokio::test]
async fn transient_failure_retries_once_and_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    // First invocation: marker absent → fail with a quota hint.
    // Second invocation: marker present → emit a full successful stream.
    let program = stub_tool(
        dir.path(),
        concat!(
            "marker=\"$(dirname \"$0\")/attempted\"\n",
            "if [ ! -f \"$marker\" ]; then\n",
            "  touch \"$marker\"\n",
            "  echo 'error: quota exceeded' >&2\n",
            "  exit 1\n",
            "fi\n",
            r#"printf '%s\n' '{"type":"init","session_id":"gs-2"}'"#,
            "\n",
            r#"printf '%s\n' '{"type":"message","role":"assistant","delta":"ok"}'"#,
            "\n",
            r#"printf '%s\n' '{"type":"result","status":"success"}'"#,
        ),
    );

    let adapter = GeminiAdapter::with_program(program.display().to_string());
    let report = adapter.run(input("go", dir.path())).await;

    assert!(report.ok, "unexpected failure: {:?}", report.error);
    assert_eq!(report.assistant_text, "ok");
    assert_eq!(report.adapter_state["session_id"], "gs-2");
}

#[tokio::test]
async fn retry_fires_at_most_once() {
    let dir = tempfile::tempdir().unwrap();
    // Always fails with a transient hint; counts invocations.
    let program = stub_tool(
        dir.path(),
        concat!(
            "count=\"$(dirname \"$0\")/count\"\n",
            "echo x >> \"$count\"\n",
            "echo 'rate limit hit' >&2\n",
            "exit 1\n",
        ),
    );

    let adapter = GeminiAdapter::with_program(program.display().to_string());
    let report = adapter.run(input("go", dir.path())).await;

    // Both attempts die without a result event.
    assert_eq!(
        report.error_code(),
        Some(relay_core::ErrorCode::AdapterMissingResult)
    );
    let count = std::fs::read_to_string(dir.path().join("count")).unwrap();
    assert_eq!(count.lines().count(), 2, "expected exactly one retry");
}

#[tokio::test]
async fn non_transient_failure_does_not_retry() {
    let dir = tempfile::tempdir().unwrap();
    let program = stub_tool(
        dir.path(),
        concat!(
            "count=\"$(dirname \"$0\")/count\"\n",
            "echo x >> \"$count\"\n",
            "echo 'fatal: bad flag' >&2\n",
            "exit 2\n",
        ),
    );

    let adapter = GeminiAdapter::with_program(program.display().to_string());
    let _ = adapter.run(input("go", dir.path())).await;

    let count = std::fs::read_to_string(dir.path().join("count")).unwrap();
    assert_eq!(count.lines().count(), 1);
}
