// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The set of external coding CLIs a session can dispatch to.

use crate::error::{DomainError, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the supported coding CLIs.
///
/// Each tool speaks its own line-delimited JSON dialect and keeps its own
/// resume-key namespace; everything else about dispatch is uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Claude,
    Codex,
    Gemini,
}

impl Tool {
    /// All supported tools, in canonical order.
    pub const ALL: [Tool; 3] = [Tool::Claude, Tool::Codex, Tool::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Claude => "claude",
            Tool::Codex => "codex",
            Tool::Gemini => "gemini",
        }
    }

    /// Key under which this tool's resume key lives in `adapter_state`.
    ///
    /// Claude and Gemini continue a conversation via `session_id`; Codex via
    /// `thread_id`. The namespaces are distinct and never interchangeable.
    pub fn resume_state_key(&self) -> &'static str {
        match self {
            Tool::Claude | Tool::Gemini => "session_id",
            Tool::Codex => "thread_id",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(Tool::Claude),
            "codex" => Ok(Tool::Codex),
            "gemini" => Ok(Tool::Gemini),
            other => Err(DomainError::new(
                ErrorCode::InvalidToolset,
                format!("unknown tool: {other}"),
            )),
        }
    }
}

#[cfg(test)]
#[path = "tool_tests.rs"]
mod tests;
