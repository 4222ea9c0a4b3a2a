// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process spawning with streaming line capture and a hard deadline.
//!
//! The child is started from an explicit argv: no shell interpolation,
//! ever. stdin is closed; stdout and stderr are line-buffered as raw bytes
//! and their trailing partial lines are flushed at stream close. When the
//! deadline expires the child is SIGKILLed and whatever output was captured
//! so far is returned with `timed_out` set.

use crate::line_buffer::LineBuffer;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

/// Errors from process execution
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("spawn failed: {0}")]
    Spawn(std::io::Error),
    #[error("wait failed: {0}")]
    Wait(std::io::Error),
}

/// What to run and where.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
}

/// Everything captured from one child run.
#[derive(Debug)]
pub struct Capture {
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
    /// Exit status; `None` when the child was killed by the deadline.
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
}

impl Capture {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.map(|s| s.success()).unwrap_or(false)
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

/// Run the child to completion (or deadline), streaming stdout lines.
///
/// `on_stdout_line` is invoked for every complete stdout line in arrival
/// order, before the line is recorded; adapters use it for live progress
/// parsing.
pub async fn run_streaming(
    spec: &SpawnSpec,
    mut on_stdout_line: impl FnMut(&str),
) -> Result<Capture, ProcessError> {
    debug!(
        program = %spec.program,
        args = ?spec.args,
        cwd = %spec.cwd.display(),
        "spawning tool process"
    );

    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ProcessError::Spawn)?;

    // Piped handles always exist for a freshly spawned child.
    let mut stdout = match child.stdout.take() {
        Some(s) => s,
        None => return Err(ProcessError::Spawn(std::io::Error::other("stdout missing"))),
    };
    let mut stderr = match child.stderr.take() {
        Some(s) => s,
        None => return Err(ProcessError::Spawn(std::io::Error::other("stderr missing"))),
    };

    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();
    let mut out_buf = LineBuffer::new();
    let mut err_buf = LineBuffer::new();
    let mut out_chunk = [0u8; 4096];
    let mut err_chunk = [0u8; 4096];
    let mut out_done = false;
    let mut err_done = false;
    let mut timed_out = false;

    let deadline = tokio::time::sleep(spec.timeout);
    tokio::pin!(deadline);

    while !(out_done && err_done) {
        tokio::select! {
            read = stdout.read(&mut out_chunk), if !out_done => match read {
                Ok(0) | Err(_) => out_done = true,
                Ok(n) => out_buf.push(&out_chunk[..n], |line| {
                    on_stdout_line(&line);
                    stdout_lines.push(line);
                }),
            },
            read = stderr.read(&mut err_chunk), if !err_done => match read {
                Ok(0) | Err(_) => err_done = true,
                Ok(n) => err_buf.push(&err_chunk[..n], |line| stderr_lines.push(line)),
            },
            _ = &mut deadline => {
                timed_out = true;
                let _ = child.start_kill();
                break;
            }
        }
    }

    out_buf.finish(|line| {
        on_stdout_line(&line);
        stdout_lines.push(line);
    });
    err_buf.finish(|line| stderr_lines.push(line));

    let status = if timed_out {
        // Reap the killed child; the exit status is meaningless.
        let _ = child.wait().await;
        None
    } else {
        Some(child.wait().await.map_err(ProcessError::Wait)?)
    };

    debug!(
        status = ?status,
        timed_out,
        stdout_lines = stdout_lines.len(),
        stderr_lines = stderr_lines.len(),
        "tool process finished"
    );

    Ok(Capture {
        stdout_lines,
        stderr_lines,
        status,
        timed_out,
    })
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
