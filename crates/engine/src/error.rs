// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error type.

use relay_core::{DomainError, ErrorCode};
use relay_storage::{ConfigError, StoreError};
use thiserror::Error;

/// Failures surfaced by engine operations.
///
/// Domain errors carry a stable code and go back to the operator verbatim.
/// Store and config errors are infrastructure failures: callers should
/// treat them as fatal rather than retry.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn domain(code: ErrorCode, message: impl Into<String>) -> Self {
        EngineError::Domain(DomainError::new(code, message))
    }

    /// The stable code, for domain errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            EngineError::Domain(e) => Some(e.code),
            _ => None,
        }
    }
}
