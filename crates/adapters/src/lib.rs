// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Tool adapters for relay.
//!
//! One adapter per supported CLI (claude / codex / gemini). Each spawns the
//! tool as a child process with an explicit argv (never through a shell),
//! stream-parses its line-delimited JSON output, extracts the tool's
//! session-continuation key, and classifies failures into stable error
//! codes. Adapters own the child process for the duration of one run and
//! hold no persistent state.

mod adapter;
mod claude;
mod codex;
mod gemini;
mod line_buffer;
mod process;
mod progress;
mod stream;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use adapter::{AdapterFailure, AdapterSet, RunInput, RunReport, ToolAdapter};
pub use claude::ClaudeAdapter;
pub use codex::CodexAdapter;
pub use gemini::GeminiAdapter;
pub use line_buffer::LineBuffer;
pub use process::{run_streaming, Capture, ProcessError, SpawnSpec};
pub use progress::{emit_progress, ActivityKind, ProgressEvent, ProgressSink};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAdapter, FakeInvocation};
