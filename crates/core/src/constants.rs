// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frozen engine-wide constants.

/// Hard deadline for a single CLI invocation (15 minutes).
pub const CLI_TIMEOUT_SEC: u64 = 900;

/// Maximum pending jobs per session before enqueue is refused.
pub const MAX_QUEUE_PER_SESSION: usize = 20;

/// Maximum jobs running concurrently across all sessions.
pub const GLOBAL_MAX_RUNNING: usize = 2;

/// Snapshot after this many events since the last snapshot.
pub const SNAPSHOT_EVERY_EVENTS: u64 = 50;

/// Snapshot after this much wall-clock time, if any event was appended.
pub const SNAPSHOT_EVERY_SECONDS: u64 = 5;

/// Length of the stored excerpt of a job's final assistant text.
pub const MAX_RESULT_EXCERPT_CHARS: usize = 400;
