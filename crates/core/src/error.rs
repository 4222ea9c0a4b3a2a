// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed taxonomy of stable error codes.
//!
//! Every user-visible failure carries one of these codes. The string form is
//! a wire/UI contract and must never change for an existing variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable error codes for all domain, scheduling, adapter, and transport
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // -- ownership --
    #[serde(rename = "E_OWNER_ONLY")]
    OwnerOnly,

    // -- routing --
    #[serde(rename = "E_NOT_IN_MANAGED_THREAD")]
    NotInManagedThread,
    #[serde(rename = "E_SESSION_NOT_FOUND")]
    SessionNotFound,
    #[serde(rename = "E_THREAD_ACCESS_FAILED")]
    ThreadAccessFailed,

    // -- project / tool configuration --
    #[serde(rename = "E_PROJECT_NOT_FOUND")]
    ProjectNotFound,
    #[serde(rename = "E_PROJECT_EXISTS")]
    ProjectExists,
    #[serde(rename = "E_INVALID_PATH")]
    InvalidPath,
    #[serde(rename = "E_INVALID_TOOLSET")]
    InvalidToolset,
    #[serde(rename = "E_TOOL_NOT_ENABLED")]
    ToolNotEnabled,

    // -- scheduling --
    #[serde(rename = "E_QUEUE_FULL")]
    QueueFull,
    #[serde(rename = "E_JOB_NOT_RETRYABLE")]
    JobNotRetryable,

    // -- adapter runtime --
    #[serde(rename = "E_CLI_TIMEOUT")]
    CliTimeout,
    #[serde(rename = "E_CLI_EXIT_NONZERO")]
    CliExitNonzero,
    #[serde(rename = "E_ADAPTER_PARSE")]
    AdapterParse,
    #[serde(rename = "E_ADAPTER_MISSING_RESULT")]
    AdapterMissingResult,
    #[serde(rename = "E_ADAPTER_SESSION_KEY_MISSING")]
    AdapterSessionKeyMissing,

    // -- transport --
    #[serde(rename = "E_DISCORD_RATE_LIMIT")]
    DiscordRateLimit,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::OwnerOnly => "E_OWNER_ONLY",
            ErrorCode::NotInManagedThread => "E_NOT_IN_MANAGED_THREAD",
            ErrorCode::SessionNotFound => "E_SESSION_NOT_FOUND",
            ErrorCode::ThreadAccessFailed => "E_THREAD_ACCESS_FAILED",
            ErrorCode::ProjectNotFound => "E_PROJECT_NOT_FOUND",
            ErrorCode::ProjectExists => "E_PROJECT_EXISTS",
            ErrorCode::InvalidPath => "E_INVALID_PATH",
            ErrorCode::InvalidToolset => "E_INVALID_TOOLSET",
            ErrorCode::ToolNotEnabled => "E_TOOL_NOT_ENABLED",
            ErrorCode::QueueFull => "E_QUEUE_FULL",
            ErrorCode::JobNotRetryable => "E_JOB_NOT_RETRYABLE",
            ErrorCode::CliTimeout => "E_CLI_TIMEOUT",
            ErrorCode::CliExitNonzero => "E_CLI_EXIT_NONZERO",
            ErrorCode::AdapterParse => "E_ADAPTER_PARSE",
            ErrorCode::AdapterMissingResult => "E_ADAPTER_MISSING_RESULT",
            ErrorCode::AdapterSessionKeyMissing => "E_ADAPTER_SESSION_KEY_MISSING",
            ErrorCode::DiscordRateLimit => "E_DISCORD_RATE_LIMIT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain failure surfaced to the operator: stable code plus a human
/// message. No retries, no wrapping: callers match on `code`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
