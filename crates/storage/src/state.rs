// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized runtime state, rebuilt from event replay.
//!
//! Three maps plus the last applied sequence number. The only mutator is
//! [`RuntimeState::apply`]; the mapping (prior state, event) → next state is
//! pure, which is what makes snapshot+tail replay equivalent to full replay.
//!
//! All handlers are idempotent: applying the same event twice must produce
//! the same state as applying it once (guarded inserts, assignment over
//! mutation).

use relay_core::{dedupe_key, Envelope, Event, Job, JobId, JobState, Session, ThreadId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In-memory projection of all sessions, jobs, and the dedup index.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    pub sessions: HashMap<ThreadId, Session>,
    pub jobs: HashMap<JobId, Job>,
    /// `thread_id:message_id` → job id. Keys are never removed.
    pub dedupe: HashMap<String, JobId>,
    /// Sequence number of the last applied event.
    pub last_seq: u64,
}

impl RuntimeState {
    /// Apply one envelope, advancing `last_seq`.
    pub fn apply(&mut self, envelope: &Envelope) {
        let ts = envelope.ts;
        match &envelope.event {
            // Audit trail only; project config lives in config.json.
            Event::ProjectCreated { .. } => {}

            Event::SessionCreated {
                thread_id,
                project_name,
                tool,
                adapter_state,
            } => {
                self.sessions.entry(thread_id.clone()).or_insert_with(|| {
                    let mut session = Session::new(thread_id.clone(), project_name.clone(), *tool, ts);
                    session.adapter_state = adapter_state.clone();
                    session
                });
            }

            Event::ToolChanged { thread_id, tool } => {
                if let Some(session) = self.sessions.get_mut(thread_id) {
                    session.tool = *tool;
                    session.updated_at = ts;
                }
            }

            Event::JobEnqueued {
                thread_id,
                job_id,
                discord_message_id,
                prompt,
                tool,
                attempt,
            } => {
                self.jobs.entry(job_id.clone()).or_insert_with(|| {
                    Job::new(
                        job_id.clone(),
                        thread_id.clone(),
                        discord_message_id.clone(),
                        prompt.clone(),
                        *tool,
                        *attempt,
                    )
                });
                self.dedupe
                    .entry(dedupe_key(thread_id, discord_message_id))
                    .or_insert_with(|| job_id.clone());
                if let Some(session) = self.sessions.get_mut(thread_id) {
                    if !session.queue.contains(job_id) {
                        session.queue.push_back(job_id.clone());
                    }
                    session.last_activity_at = ts;
                    session.updated_at = ts;
                }
            }

            Event::JobStarted { thread_id, job_id } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    job.state = JobState::Running;
                    job.started_at = Some(ts);
                }
                if let Some(session) = self.sessions.get_mut(thread_id) {
                    session.running_job_id = Some(job_id.clone());
                    session.queue.retain(|id| id != job_id);
                    session.updated_at = ts;
                }
            }

            Event::JobCompleted {
                thread_id,
                job_id,
                result_excerpt,
                adapter_state,
            } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    job.state = JobState::Success;
                    job.finished_at = Some(ts);
                    job.result_excerpt = Some(result_excerpt.clone());
                }
                if let Some(session) = self.sessions.get_mut(thread_id) {
                    session.running_job_id = None;
                    session.last_job_id = Some(job_id.clone());
                    session
                        .adapter_state
                        .extend(adapter_state.iter().map(|(k, v)| (k.clone(), v.clone())));
                    session.updated_at = ts;
                }
            }

            Event::JobFailed {
                thread_id,
                job_id,
                error_code,
                error_message,
                adapter_state,
            } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    job.state = JobState::Failed;
                    job.finished_at = Some(ts);
                    job.error_code = Some(*error_code);
                    job.error_message = Some(error_message.clone());
                }
                if let Some(session) = self.sessions.get_mut(thread_id) {
                    session.running_job_id = None;
                    session.last_job_id = Some(job_id.clone());
                    if let Some(state) = adapter_state {
                        session
                            .adapter_state
                            .extend(state.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                    session.updated_at = ts;
                }
            }

            Event::JobMarkedUnknownAfterCrash { thread_id, job_id } => {
                if let Some(job) = self.jobs.get_mut(job_id) {
                    job.state = JobState::UnknownAfterCrash;
                }
                if let Some(session) = self.sessions.get_mut(thread_id) {
                    session.running_job_id = None;
                    session.last_job_id = Some(job_id.clone());
                    session.updated_at = ts;
                }
            }
        }

        self.last_seq = envelope.seq;
    }

    /// Get a job by ID or unique prefix (like git commit hashes).
    pub fn find_job(&self, id: &str) -> Option<&Job> {
        if let Some(job) = self.jobs.get(id) {
            return Some(job);
        }

        let mut matches = self.jobs.iter().filter(|(k, _)| k.as_str().starts_with(id));
        match (matches.next(), matches.next()) {
            (Some((_, job)), None) => Some(job),
            _ => None,
        }
    }

    /// Count of jobs currently in state `running`, across all sessions.
    pub fn running_count(&self) -> usize {
        self.jobs
            .values()
            .filter(|j| j.state == JobState::Running)
            .count()
    }

    /// Ids of jobs currently in state `running`, ordered for determinism.
    pub fn running_job_ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self
            .jobs
            .values()
            .filter(|j| j.state == JobState::Running)
            .map(|j| j.job_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// True when nothing is running and every queue is empty.
    pub fn is_idle(&self) -> bool {
        self.running_count() == 0 && self.sessions.values().all(|s| s.queue.is_empty())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
