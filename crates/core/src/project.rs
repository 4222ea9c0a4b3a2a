// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration.
//!
//! A project binds a name to a filesystem path and the set of tools the
//! owner allows there. Projects live in `config.json`, not the event log;
//! the `ProjectCreated` event is an audit record only.

use crate::tool::Tool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Longest allowed project name.
pub const MAX_PROJECT_NAME_LEN: usize = 40;

/// Validate a project name: `[a-z0-9_-]{1,40}`.
pub fn validate_project_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_PROJECT_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Long-lived configuration for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    /// Absolute path; must exist when the project is created.
    pub path: PathBuf,
    /// Tools the owner enabled for this project (non-empty).
    pub enabled_tools: Vec<Tool>,
    pub default_tool: Tool,
    /// Extra argv passed verbatim to each invocation of the given tool.
    #[serde(default)]
    pub default_args: HashMap<Tool, Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectConfig {
    pub fn tool_enabled(&self, tool: Tool) -> bool {
        self.enabled_tools.contains(&tool)
    }

    /// Default argv for a tool, empty when none configured.
    pub fn args_for(&self, tool: Tool) -> &[String] {
        self.default_args
            .get(&tool)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
