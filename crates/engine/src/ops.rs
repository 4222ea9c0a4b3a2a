// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator-facing engine operations.
//!
//! Each chat command maps onto exactly one of these. All argument
//! validation lives here; every rejection carries a stable error code and
//! writes no event.

use crate::coordinator::Coordinator;
use crate::error::EngineError;
use chrono::Utc;
use relay_core::constants::MAX_QUEUE_PER_SESSION;
use relay_core::{
    dedupe_key, validate_project_name, ErrorCode, Event, IdGen, Job, JobId, JobState, MessageId,
    ProjectConfig, Session, ThreadId, Tool,
};
use std::collections::HashMap;
use std::path::Path;

/// Result of an enqueue request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOutcome {
    pub job_id: JobId,
    /// True when the message id had already enqueued a job; `job_id` then
    /// names the existing job and no event was written.
    pub deduped: bool,
}

/// Operator view of one session.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub session: Session,
    pub running: Option<Job>,
    pub queued: Vec<Job>,
    pub last: Option<Job>,
    /// Set when the last job can be retried (`failed` / `unknown_after_crash`).
    pub retry_hint: Option<JobId>,
}

/// Operator view of one project.
#[derive(Debug, Clone)]
pub struct ProjectStatus {
    pub project: ProjectConfig,
    pub session_count: usize,
    pub queued: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl<G: IdGen + 'static> Coordinator<G> {
    /// Register a new project after validating name, path, and toolset.
    pub fn create_project(
        &self,
        name: &str,
        path: &Path,
        tools: &[Tool],
        default_tool: Option<Tool>,
    ) -> Result<ProjectConfig, EngineError> {
        if !validate_project_name(name) {
            return Err(EngineError::domain(
                ErrorCode::InvalidPath,
                format!("invalid project name {name:?}: want [a-z0-9_-], max 40 chars"),
            ));
        }
        if !path.is_absolute() {
            return Err(EngineError::domain(
                ErrorCode::InvalidPath,
                format!("project path must be absolute: {}", path.display()),
            ));
        }
        if !path.is_dir() {
            return Err(EngineError::domain(
                ErrorCode::InvalidPath,
                format!("project path does not exist: {}", path.display()),
            ));
        }
        let Some(first_tool) = tools.first().copied() else {
            return Err(EngineError::domain(
                ErrorCode::InvalidToolset,
                "at least one tool must be enabled",
            ));
        };
        let default_tool = default_tool.unwrap_or(first_tool);
        if !tools.contains(&default_tool) {
            return Err(EngineError::domain(
                ErrorCode::InvalidToolset,
                format!("default tool {default_tool} is not in the enabled set"),
            ));
        }

        let project = {
            let mut config = self.inner.config.lock();
            if config.project(name).is_some() {
                return Err(EngineError::domain(
                    ErrorCode::ProjectExists,
                    format!("project already exists: {name}"),
                ));
            }
            let now = Utc::now();
            let project = ProjectConfig {
                name: name.to_string(),
                path: path.to_owned(),
                enabled_tools: tools.to_vec(),
                default_tool,
                default_args: HashMap::new(),
                created_at: now,
                updated_at: now,
            };
            config.upsert_project(project.clone())?;
            project
        };

        self.inner.store.lock().append(Event::ProjectCreated {
            project_name: project.name.clone(),
            path: project.path.clone(),
            enabled_tools: project.enabled_tools.clone(),
        })?;

        Ok(project)
    }

    /// Bind a chat thread to a project, creating the session if needed.
    /// Re-opening an existing session is a no-op that returns it.
    pub fn open_session(
        &self,
        thread_id: &ThreadId,
        project_name: &str,
        tool: Option<Tool>,
    ) -> Result<Session, EngineError> {
        let project = self
            .inner
            .config
            .lock()
            .project(project_name)
            .cloned()
            .ok_or_else(|| {
                EngineError::domain(
                    ErrorCode::ProjectNotFound,
                    format!("no such project: {project_name}"),
                )
            })?;
        let tool = tool.unwrap_or(project.default_tool);
        if !project.tool_enabled(tool) {
            return Err(EngineError::domain(
                ErrorCode::ToolNotEnabled,
                format!("tool {tool} is not enabled for project {project_name}"),
            ));
        }

        let mut store = self.inner.store.lock();
        if let Some(existing) = store.state().sessions.get(thread_id) {
            return Ok(existing.clone());
        }
        store.append(Event::SessionCreated {
            thread_id: thread_id.clone(),
            project_name: project_name.to_string(),
            tool,
            adapter_state: HashMap::new(),
        })?;
        store
            .state()
            .sessions
            .get(thread_id)
            .cloned()
            .ok_or_else(|| {
                EngineError::domain(ErrorCode::SessionNotFound, "session missing after create")
            })
    }

    /// Enqueue one prompt. Exactly-once per `(thread, message)`: a repeat
    /// returns the original job with `deduped = true` and writes nothing.
    pub fn enqueue(
        &self,
        thread_id: &ThreadId,
        message_id: &MessageId,
        prompt: &str,
    ) -> Result<EnqueueOutcome, EngineError> {
        let outcome = {
            let mut store = self.inner.store.lock();
            let key = dedupe_key(thread_id, message_id);

            let (existing, queue_len, tool) = {
                let state = store.state();
                let session = state.sessions.get(thread_id).ok_or_else(|| {
                    EngineError::domain(
                        ErrorCode::SessionNotFound,
                        format!("no session for thread {thread_id}"),
                    )
                })?;
                (
                    state.dedupe.get(&key).cloned(),
                    session.queue.len(),
                    session.tool,
                )
            };

            if let Some(job_id) = existing {
                return Ok(EnqueueOutcome {
                    job_id,
                    deduped: true,
                });
            }
            if queue_len >= MAX_QUEUE_PER_SESSION {
                return Err(EngineError::domain(
                    ErrorCode::QueueFull,
                    format!("queue full: {MAX_QUEUE_PER_SESSION} jobs pending"),
                ));
            }

            let job_id = JobId::new(self.inner.id_gen.next());
            store.append(Event::JobEnqueued {
                thread_id: thread_id.clone(),
                job_id: job_id.clone(),
                discord_message_id: message_id.clone(),
                prompt: prompt.to_string(),
                tool,
                attempt: 1,
            })?;
            EnqueueOutcome {
                job_id,
                deduped: false,
            }
        };

        self.notify_new_work();
        Ok(outcome)
    }

    /// Switch the session's tool for future enqueues.
    pub fn set_tool(&self, thread_id: &ThreadId, tool: Tool) -> Result<(), EngineError> {
        let project_name = self
            .inner
            .store
            .lock()
            .state()
            .sessions
            .get(thread_id)
            .map(|s| s.project_name.clone())
            .ok_or_else(|| {
                EngineError::domain(
                    ErrorCode::SessionNotFound,
                    format!("no session for thread {thread_id}"),
                )
            })?;

        let enabled = self
            .inner
            .config
            .lock()
            .project(&project_name)
            .map(|p| p.tool_enabled(tool))
            .ok_or_else(|| {
                EngineError::domain(
                    ErrorCode::ProjectNotFound,
                    format!("project not configured: {project_name}"),
                )
            })?;
        if !enabled {
            return Err(EngineError::domain(
                ErrorCode::ToolNotEnabled,
                format!("tool {tool} is not enabled for project {project_name}"),
            ));
        }

        self.inner.store.lock().append(Event::ToolChanged {
            thread_id: thread_id.clone(),
            tool,
        })?;
        Ok(())
    }

    /// Re-enqueue a failed or crash-orphaned job as a fresh job.
    ///
    /// `job_ref` may be a full id or unique prefix; defaults to the
    /// session's last job. The new job uses the session's *current* tool,
    /// since switching tools and retrying is the recovery path for a
    /// tool-specific failure.
    pub fn retry(
        &self,
        thread_id: &ThreadId,
        job_ref: Option<&str>,
    ) -> Result<EnqueueOutcome, EngineError> {
        let outcome = {
            let mut store = self.inner.store.lock();

            let (prev, queue_len, tool) = {
                let state = store.state();
                let session = state.sessions.get(thread_id).ok_or_else(|| {
                    EngineError::domain(
                        ErrorCode::SessionNotFound,
                        format!("no session for thread {thread_id}"),
                    )
                })?;
                let prev = match job_ref {
                    Some(r) => state.find_job(r).cloned(),
                    None => session
                        .last_job_id
                        .as_ref()
                        .and_then(|id| state.jobs.get(id))
                        .cloned(),
                };
                (prev, session.queue.len(), session.tool)
            };

            let prev = prev.ok_or_else(|| {
                EngineError::domain(ErrorCode::JobNotRetryable, "no job to retry")
            })?;
            if prev.thread_id != *thread_id {
                return Err(EngineError::domain(
                    ErrorCode::JobNotRetryable,
                    "job belongs to a different thread",
                ));
            }
            if !prev.state.is_retryable() {
                return Err(EngineError::domain(
                    ErrorCode::JobNotRetryable,
                    format!("job {} is {}", prev.job_id, prev.state),
                ));
            }
            if queue_len >= MAX_QUEUE_PER_SESSION {
                return Err(EngineError::domain(
                    ErrorCode::QueueFull,
                    format!("queue full: {MAX_QUEUE_PER_SESSION} jobs pending"),
                ));
            }

            let job_id = JobId::new(self.inner.id_gen.next());
            // Synthetic message id keeps the dedup key unique per retry.
            let message_id = MessageId::new(format!("retry:{}:{}", prev.job_id, job_id));
            store.append(Event::JobEnqueued {
                thread_id: thread_id.clone(),
                job_id: job_id.clone(),
                discord_message_id: message_id,
                prompt: prev.prompt.clone(),
                tool,
                attempt: prev.attempt + 1,
            })?;
            EnqueueOutcome {
                job_id,
                deduped: false,
            }
        };

        self.notify_new_work();
        Ok(outcome)
    }

    /// Session overview for `/status`.
    pub fn session_status(&self, thread_id: &ThreadId) -> Result<SessionStatus, EngineError> {
        let store = self.inner.store.lock();
        let state = store.state();
        let session = state.sessions.get(thread_id).cloned().ok_or_else(|| {
            EngineError::domain(
                ErrorCode::SessionNotFound,
                format!("no session for thread {thread_id}"),
            )
        })?;

        let running = session
            .running_job_id
            .as_ref()
            .and_then(|id| state.jobs.get(id))
            .cloned();
        let queued = session
            .queue
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .cloned()
            .collect();
        let last = session
            .last_job_id
            .as_ref()
            .and_then(|id| state.jobs.get(id))
            .cloned();
        let retry_hint = last
            .as_ref()
            .filter(|job| job.state.is_retryable())
            .map(|job| job.job_id.clone());

        Ok(SessionStatus {
            session,
            running,
            queued,
            last,
            retry_hint,
        })
    }

    /// All sessions, ordered by thread id.
    pub fn list_sessions(&self) -> Vec<Session> {
        let store = self.inner.store.lock();
        let mut sessions: Vec<Session> = store.state().sessions.values().cloned().collect();
        sessions.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
        sessions
    }

    /// All projects, ordered by name.
    pub fn list_projects(&self) -> Vec<ProjectConfig> {
        let config = self.inner.config.lock();
        let mut projects: Vec<ProjectConfig> = config.projects().values().cloned().collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        projects
    }

    /// Project overview for `project status`.
    pub fn project_status(&self, name: &str) -> Result<ProjectStatus, EngineError> {
        let project = self
            .inner
            .config
            .lock()
            .project(name)
            .cloned()
            .ok_or_else(|| {
                EngineError::domain(ErrorCode::ProjectNotFound, format!("no such project: {name}"))
            })?;

        let store = self.inner.store.lock();
        let state = store.state();
        let threads: Vec<&ThreadId> = state
            .sessions
            .values()
            .filter(|s| s.project_name == name)
            .map(|s| &s.thread_id)
            .collect();

        let mut status = ProjectStatus {
            project,
            session_count: threads.len(),
            queued: 0,
            running: 0,
            succeeded: 0,
            failed: 0,
            unknown: 0,
        };
        for job in state.jobs.values() {
            if !threads.contains(&&job.thread_id) {
                continue;
            }
            match job.state {
                JobState::Queued => status.queued += 1,
                JobState::Running => status.running += 1,
                JobState::Success => status.succeeded += 1,
                JobState::Failed => status.failed += 1,
                JobState::UnknownAfterCrash => status.unknown += 1,
            }
        }
        Ok(status)
    }
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;
