// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn writes_prefixed_lines_in_stream_order() {
    let dir = tempdir().unwrap();
    let logger = JobLogger::new(dir.path().to_path_buf());

    let report = RunReport {
        stdout_lines: vec!["out-1".to_string(), "out-2".to_string()],
        stderr_lines: vec!["err-1".to_string()],
        diagnostic_logs: vec!["diag-1".to_string()],
        ..Default::default()
    };

    let path = logger.write(&JobId::new("j-1"), &report).unwrap();
    assert_eq!(path, dir.path().join("job").join("j-1.log"));

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "[stdout] out-1\n[stdout] out-2\n[stderr] err-1\n[diagnostic] diag-1\n"
    );
}

#[test]
fn empty_report_writes_empty_file() {
    let dir = tempdir().unwrap();
    let logger = JobLogger::new(dir.path().to_path_buf());

    let path = logger
        .write(&JobId::new("j-2"), &RunReport::default())
        .unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}
