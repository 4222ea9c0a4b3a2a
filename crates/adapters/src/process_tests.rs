// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn sh(script: &str, timeout: Duration) -> SpawnSpec {
    SpawnSpec {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        cwd: std::env::temp_dir(),
        timeout,
    }
}

#[tokio::test]
async fn captures_stdout_and_stderr_separately() {
    let spec = sh("echo out1; echo err1 >&2; echo out2", Duration::from_secs(5));
    let capture = run_streaming(&spec, |_| {}).await.unwrap();

    assert!(capture.success());
    assert_eq!(capture.stdout_lines, ["out1", "out2"]);
    assert_eq!(capture.stderr_lines, ["err1"]);
}

#[tokio::test]
async fn stdout_callback_sees_lines_in_order() {
    let spec = sh("printf 'a\\nb\\nc\\n'", Duration::from_secs(5));
    let mut seen = Vec::new();
    let capture = run_streaming(&spec, |line| seen.push(line.to_string()))
        .await
        .unwrap();

    assert_eq!(seen, ["a", "b", "c"]);
    assert_eq!(capture.stdout_lines, seen);
}

#[tokio::test]
async fn trailing_partial_line_is_flushed() {
    let spec = sh("printf 'no-newline'", Duration::from_secs(5));
    let capture = run_streaming(&spec, |_| {}).await.unwrap();
    assert_eq!(capture.stdout_lines, ["no-newline"]);
}

#[tokio::test]
async fn nonzero_exit_is_reported() {
    let spec = sh("echo partial; exit 3", Duration::from_secs(5));
    let capture = run_streaming(&spec, |_| {}).await.unwrap();

    assert!(!capture.success());
    assert_eq!(capture.exit_code(), Some(3));
    assert_eq!(capture.stdout_lines, ["partial"]);
}

#[tokio::test]
async fn deadline_kills_the_child() {
    let spec = sh("echo early; sleep 30", Duration::from_millis(200));
    let start = std::time::Instant::now();
    let capture = run_streaming(&spec, |_| {}).await.unwrap();

    assert!(capture.timed_out);
    assert!(!capture.success());
    assert!(capture.status.is_none());
    // Partial output before the kill is retained.
    assert_eq!(capture.stdout_lines, ["early"]);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn missing_binary_is_a_spawn_error() {
    let spec = SpawnSpec {
        program: "definitely-not-a-real-binary-xyz".to_string(),
        args: vec![],
        cwd: std::env::temp_dir(),
        timeout: Duration::from_secs(1),
    };
    assert!(matches!(
        run_streaming(&spec, |_| {}).await.unwrap_err(),
        ProcessError::Spawn(_)
    ));
}
