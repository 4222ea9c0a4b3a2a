// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job coordinator: run loop, admission, adapter invocation, hooks.
//!
//! One logical task owns every scheduling decision. `notify_new_work` is an
//! edge-triggered kick guarded by a flag; the loop admits runnable jobs
//! (appending `JobStarted` under the store lock, so a thread can never be
//! picked twice) and spawns one background task per admitted job. State is
//! mutated exclusively through the single-writer event store.

use crate::error::EngineError;
use crate::job_logger::JobLogger;
use crate::scheduler;
use parking_lot::Mutex;
use relay_adapters::{
    AdapterFailure, AdapterSet, ProgressEvent, ProgressSink, RunInput, RunReport,
};
use relay_core::constants::CLI_TIMEOUT_SEC;
use relay_core::{excerpt, ErrorCode, Event, IdGen, JobId, JobState, ThreadId, UuidIdGen};
use relay_storage::{ConfigStore, EventStore, RuntimeState};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Poll interval for `wait_for_idle`.
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Hook fired when a job transitions to running.
pub type JobHook = Arc<dyn Fn(&ThreadId, &JobId) -> Result<(), String> + Send + Sync>;

/// Hook fired for each streaming progress event of a running job.
pub type ProgressHook =
    Arc<dyn Fn(&ThreadId, &JobId, &ProgressEvent) -> Result<(), String> + Send + Sync>;

/// Hook fired when a job reaches success or failure.
pub type FinishedHook =
    Arc<dyn Fn(&ThreadId, &JobId, &JobOutcome) -> Result<(), String> + Send + Sync>;

/// Callbacks toward the chat surface. All failures are logged and swallowed.
#[derive(Clone, Default)]
pub struct Hooks {
    pub on_job_started: Option<JobHook>,
    pub on_job_progress: Option<ProgressHook>,
    pub on_job_finished: Option<FinishedHook>,
}

/// Terminal outcome handed to `on_job_finished`.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub state: JobState,
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub result_excerpt: Option<String>,
}

/// Filesystem layout and limits for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root state directory (event log + snapshot).
    pub state_dir: PathBuf,
    /// Location of `config.json`.
    pub config_path: PathBuf,
    /// Directory for per-job log files.
    pub log_dir: PathBuf,
    /// Hard deadline per adapter run.
    pub cli_timeout: Duration,
}

impl EngineConfig {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            config_path: state_dir.join("config.json"),
            log_dir: state_dir.join("logs"),
            cli_timeout: Duration::from_secs(CLI_TIMEOUT_SEC),
            state_dir,
        }
    }

    pub fn with_cli_timeout(mut self, timeout: Duration) -> Self {
        self.cli_timeout = timeout;
        self
    }
}

pub(crate) struct CoordinatorInner<G: IdGen> {
    pub(crate) store: Mutex<EventStore>,
    pub(crate) config: Mutex<ConfigStore>,
    pub(crate) adapters: AdapterSet,
    pub(crate) hooks: Mutex<Hooks>,
    pub(crate) job_logger: JobLogger,
    pub(crate) id_gen: G,
    pub(crate) cli_timeout: Duration,
    kick_running: AtomicBool,
}

/// The engine's public face. Cheap to clone; all clones share one store.
pub struct Coordinator<G: IdGen = UuidIdGen> {
    pub(crate) inner: Arc<CoordinatorInner<G>>,
}

impl<G: IdGen> Clone for Coordinator<G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Coordinator<UuidIdGen> {
    /// Open with production id generation.
    pub fn open(
        config: EngineConfig,
        adapters: AdapterSet,
    ) -> Result<(Self, Vec<JobId>), EngineError> {
        Self::open_with_ids(config, adapters, UuidIdGen)
    }
}

impl<G: IdGen + 'static> Coordinator<G> {
    /// Open the engine: replay durable state, run crash recovery, wire the
    /// config store. Returns the ids of jobs marked `unknown_after_crash`
    /// so the caller can surface them to the owner.
    pub fn open_with_ids(
        config: EngineConfig,
        adapters: AdapterSet,
        id_gen: G,
    ) -> Result<(Self, Vec<JobId>), EngineError> {
        let (store, marked) = EventStore::open(&config.state_dir)?;
        let config_store = ConfigStore::open(&config.config_path)?;

        let inner = Arc::new(CoordinatorInner {
            store: Mutex::new(store),
            config: Mutex::new(config_store),
            adapters,
            hooks: Mutex::new(Hooks::default()),
            job_logger: JobLogger::new(config.log_dir),
            id_gen,
            cli_timeout: config.cli_timeout,
            kick_running: AtomicBool::new(false),
        });

        Ok((Self { inner }, marked))
    }

    /// Install chat-surface callbacks.
    pub fn set_hooks(&self, hooks: Hooks) {
        *self.inner.hooks.lock() = hooks;
    }

    /// Edge-triggered kick. Idempotent; safe to call redundantly. Must be
    /// called from within a tokio runtime.
    pub fn notify_new_work(&self) {
        CoordinatorInner::spawn_kick(self.inner.clone());
    }

    /// Resolve once nothing is running and every queue is empty.
    pub async fn wait_for_idle(&self) {
        loop {
            let idle = self.inner.store.lock().state().is_idle();
            if idle {
                break;
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
    }

    /// Deep copy of the projection (callers can never mutate engine state).
    pub fn state_snapshot(&self) -> RuntimeState {
        self.inner.store.lock().state_snapshot()
    }
}

impl<G: IdGen + 'static> CoordinatorInner<G> {
    /// Start the run loop unless it is already running.
    fn spawn_kick(inner: Arc<Self>) {
        if inner.kick_running.swap(true, Ordering::SeqCst) {
            return;
        }
        tokio::spawn(async move { Self::run_kick(inner).await });
    }

    /// Admit runnable jobs until the cap binds or queues drain.
    async fn run_kick(inner: Arc<Self>) {
        loop {
            let admitted = {
                let mut store = inner.store.lock();
                match scheduler::next_runnable(store.state()) {
                    Some((thread_id, job_id)) => {
                        // JobStarted under the store lock: the session's
                        // running_job_id is set before anyone can re-pick.
                        match store.append(Event::JobStarted {
                            thread_id: thread_id.clone(),
                            job_id: job_id.clone(),
                        }) {
                            Ok(_) => Some((thread_id, job_id)),
                            Err(e) => {
                                // Durable append failed; scheduling more work
                                // would silently diverge from disk.
                                error!(error = %e, "event append failed; halting run loop");
                                return;
                            }
                        }
                    }
                    None => None,
                }
            };

            let Some((thread_id, job_id)) = admitted else {
                break;
            };

            let task_inner = inner.clone();
            tokio::spawn(async move {
                task_inner.process_job(thread_id, job_id).await;
                Self::spawn_kick(task_inner);
            });
        }

        inner.kick_running.store(false, Ordering::SeqCst);

        // A kick that arrived while the flag was set would have been lost;
        // re-check now that it is clear.
        let has_work = scheduler::next_runnable(inner.store.lock().state()).is_some();
        if has_work {
            Self::spawn_kick(inner);
        }
    }

    /// Run one admitted job to completion. Never propagates errors: every
    /// failure path lands in a `JobFailed` event.
    async fn process_job(&self, thread_id: ThreadId, job_id: JobId) {
        debug!(%thread_id, %job_id, "processing job");
        self.fire_started(&thread_id, &job_id);

        let (job, session) = {
            let store = self.store.lock();
            let state = store.state();
            (
                state.jobs.get(&job_id).cloned(),
                state.sessions.get(&thread_id).cloned(),
            )
        };

        let (job, session) = match (job, session) {
            (Some(job), Some(session)) => (job, session),
            _ => {
                self.finish_failed(
                    &thread_id,
                    &job_id,
                    ErrorCode::AdapterParse,
                    "job or session missing after start".to_string(),
                    None,
                );
                return;
            }
        };

        let project = self.config.lock().project(&session.project_name).cloned();
        let Some(project) = project else {
            self.finish_failed(
                &thread_id,
                &job_id,
                ErrorCode::ProjectNotFound,
                format!("project not configured: {}", session.project_name),
                None,
            );
            return;
        };

        let Some(adapter) = self.adapters.get(job.tool) else {
            self.finish_failed(
                &thread_id,
                &job_id,
                ErrorCode::ToolNotEnabled,
                format!("no adapter registered for {}", job.tool),
                None,
            );
            return;
        };

        let input = RunInput {
            prompt: job.prompt.clone(),
            cwd: project.path.clone(),
            timeout: self.cli_timeout,
            resume_key: session.resume_key_for(job.tool).map(str::to_string),
            extra_args: project.args_for(job.tool).to_vec(),
            on_progress: Some(self.progress_sink(&thread_id, &job_id)),
        };

        let report = adapter.run(input).await;

        if let Err(e) = self.job_logger.write(&job_id, &report) {
            warn!(%job_id, error = %e, "failed to write job log");
        }

        self.finish(&thread_id, &job_id, report);
    }

    fn finish(&self, thread_id: &ThreadId, job_id: &JobId, report: RunReport) {
        if report.ok {
            let result_excerpt = excerpt(&report.assistant_text);
            let appended = self.append_logged(Event::JobCompleted {
                thread_id: thread_id.clone(),
                job_id: job_id.clone(),
                result_excerpt: result_excerpt.clone(),
                adapter_state: report.adapter_state,
            });
            if appended {
                self.fire_finished(
                    thread_id,
                    job_id,
                    JobOutcome {
                        state: JobState::Success,
                        error_code: None,
                        error_message: None,
                        result_excerpt: Some(result_excerpt),
                    },
                );
            }
        } else {
            let failure = report.error.unwrap_or_else(|| {
                AdapterFailure::new(
                    ErrorCode::AdapterParse,
                    "adapter reported failure without a code",
                )
            });
            let adapter_state = if report.adapter_state.is_empty() {
                None
            } else {
                Some(report.adapter_state)
            };
            self.finish_failed(thread_id, job_id, failure.code, failure.message, adapter_state);
        }
    }

    fn finish_failed(
        &self,
        thread_id: &ThreadId,
        job_id: &JobId,
        code: ErrorCode,
        message: String,
        adapter_state: Option<HashMap<String, String>>,
    ) {
        let appended = self.append_logged(Event::JobFailed {
            thread_id: thread_id.clone(),
            job_id: job_id.clone(),
            error_code: code,
            error_message: message.clone(),
            adapter_state,
        });
        if appended {
            self.fire_finished(
                thread_id,
                job_id,
                JobOutcome {
                    state: JobState::Failed,
                    error_code: Some(code),
                    error_message: Some(message),
                    result_excerpt: None,
                },
            );
        }
    }

    fn append_logged(&self, event: Event) -> bool {
        match self.store.lock().append(event) {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "event append failed");
                false
            }
        }
    }

    /// Sink forwarding adapter progress to the `on_job_progress` hook, with
    /// identical consecutive activities debounced.
    fn progress_sink(&self, thread_id: &ThreadId, job_id: &JobId) -> ProgressSink {
        let hook = self.hooks.lock().on_job_progress.clone();
        let thread_id = thread_id.clone();
        let job_id = job_id.clone();
        let last_activity: Mutex<Option<ProgressEvent>> = Mutex::new(None);

        Arc::new(move |event: &ProgressEvent| {
            if matches!(event, ProgressEvent::Activity { .. }) {
                let mut last = last_activity.lock();
                if last.as_ref() == Some(event) {
                    return Ok(());
                }
                *last = Some(event.clone());
            }
            match &hook {
                Some(hook) => hook(&thread_id, &job_id, event),
                None => Ok(()),
            }
        })
    }

    fn fire_started(&self, thread_id: &ThreadId, job_id: &JobId) {
        let hook = self.hooks.lock().on_job_started.clone();
        if let Some(hook) = hook {
            if let Err(e) = hook(thread_id, job_id) {
                warn!(error = e, "job-started hook failed");
            }
        }
    }

    fn fire_finished(&self, thread_id: &ThreadId, job_id: &JobId, outcome: JobOutcome) {
        let hook = self.hooks.lock().on_job_finished.clone();
        if let Some(hook) = hook {
            if let Err(e) = hook(thread_id, job_id, &outcome) {
                warn!(error = e, "job-finished hook failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
