// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration store (`config.json`).
//!
//! Projects are long-lived operator configuration, kept outside the event
//! log. Writes use the same temp-file + fsync + atomic-rename discipline as
//! snapshots.

use relay_core::ProjectConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Errors that can occur in config store operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported config version {0}")]
    Version(u32),
}

/// On-disk shape of `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    /// Chat user id of the single owner. Empty until first configured.
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub projects: HashMap<String, ProjectConfig>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            owner_id: String::new(),
            projects: HashMap::new(),
        }
    }
}

/// Load/save wrapper around `config.json`.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: ConfigFile,
}

impl ConfigStore {
    /// Open the store, creating an empty config when the file is absent.
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let file = File::open(path)?;
            let config: ConfigFile = serde_json::from_reader(BufReader::new(file))?;
            if config.version != CURRENT_CONFIG_VERSION {
                return Err(ConfigError::Version(config.version));
            }
            config
        } else {
            ConfigFile::default()
        };

        Ok(Self {
            path: path.to_owned(),
            config,
        })
    }

    pub fn owner_id(&self) -> &str {
        &self.config.owner_id
    }

    pub fn set_owner_id(&mut self, owner_id: impl Into<String>) -> Result<(), ConfigError> {
        self.config.owner_id = owner_id.into();
        self.save()
    }

    pub fn project(&self, name: &str) -> Option<&ProjectConfig> {
        self.config.projects.get(name)
    }

    pub fn projects(&self) -> &HashMap<String, ProjectConfig> {
        &self.config.projects
    }

    /// Insert or replace a project and persist.
    pub fn upsert_project(&mut self, project: ProjectConfig) -> Result<(), ConfigError> {
        self.config.projects.insert(project.name.clone(), project);
        self.save()
    }

    fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = PathBuf::from(format!("{}.tmp", self.path.display()));
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &self.config)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
