// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake tool adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::adapter::{AdapterFailure, RunInput, RunReport, ToolAdapter};
use crate::progress::{emit_progress, ProgressEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{ErrorCode, Tool};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Recorded invocation of a [`FakeAdapter`].
#[derive(Debug, Clone)]
pub struct FakeInvocation {
    pub prompt: String,
    pub cwd: PathBuf,
    pub resume_key: Option<String>,
    pub extra_args: Vec<String>,
}

struct FakeState {
    invocations: Vec<FakeInvocation>,
    failures: HashMap<String, AdapterFailure>,
    progress_script: Vec<ProgressEvent>,
    delay: Duration,
    resume_key_value: String,
    in_flight: usize,
    max_in_flight: usize,
}

/// Scriptable adapter that records every call.
///
/// By default each run succeeds with `done:<prompt>` and reports the
/// tool-appropriate resume key.
#[derive(Clone)]
pub struct FakeAdapter {
    tool: Tool,
    inner: Arc<Mutex<FakeState>>,
}

impl FakeAdapter {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            inner: Arc::new(Mutex::new(FakeState {
                invocations: Vec::new(),
                failures: HashMap::new(),
                progress_script: Vec::new(),
                delay: Duration::ZERO,
                resume_key_value: "k".to_string(),
                in_flight: 0,
                max_in_flight: 0,
            })),
        }
    }

    /// Make runs for `prompt` fail with the given code.
    pub fn fail_with(&self, prompt: &str, code: ErrorCode, message: &str) {
        self.inner
            .lock()
            .failures
            .insert(prompt.to_string(), AdapterFailure::new(code, message));
    }

    /// Sleep this long inside each run (to exercise concurrency limits).
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = delay;
    }

    /// Progress events to emit on every run, in order.
    pub fn script_progress(&self, events: Vec<ProgressEvent>) {
        self.inner.lock().progress_script = events;
    }

    /// Resume key reported in `adapter_state` on success.
    pub fn set_resume_key_value(&self, value: &str) {
        self.inner.lock().resume_key_value = value.to_string();
    }

    /// All recorded invocations.
    pub fn invocations(&self) -> Vec<FakeInvocation> {
        self.inner.lock().invocations.clone()
    }

    /// Prompts seen, in invocation order.
    pub fn prompts(&self) -> Vec<String> {
        self.inner
            .lock()
            .invocations
            .iter()
            .map(|i| i.prompt.clone())
            .collect()
    }

    /// Highest number of concurrently running invocations observed.
    pub fn max_in_flight(&self) -> usize {
        self.inner.lock().max_in_flight
    }
}

#[async_trait]
impl ToolAdapter for FakeAdapter {
    fn tool(&self) -> Tool {
        self.tool
    }

    async fn run(&self, input: RunInput) -> RunReport {
        let (delay, script) = {
            let mut state = self.inner.lock();
            state.invocations.push(FakeInvocation {
                prompt: input.prompt.clone(),
                cwd: input.cwd.clone(),
                resume_key: input.resume_key.clone(),
                extra_args: input.extra_args.clone(),
            });
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            (state.delay, state.progress_script.clone())
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        for event in script {
            emit_progress(input.on_progress.as_ref(), event);
        }

        let report = {
            let mut state = self.inner.lock();
            state.in_flight -= 1;

            match state.failures.get(&input.prompt) {
                Some(failure) => RunReport {
                    error: Some(failure.clone()),
                    stdout_lines: vec![format!("fake failure for: {}", input.prompt)],
                    ..Default::default()
                },
                None => {
                    let mut adapter_state = HashMap::new();
                    adapter_state.insert(
                        self.tool.resume_state_key().to_string(),
                        state.resume_key_value.clone(),
                    );
                    RunReport {
                        ok: true,
                        assistant_text: format!("done:{}", input.prompt),
                        adapter_state,
                        stdout_lines: vec![format!("fake run: {}", input.prompt)],
                        ..Default::default()
                    }
                }
            }
        };

        report
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
