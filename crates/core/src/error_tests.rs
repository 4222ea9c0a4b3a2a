// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    queue_full = { ErrorCode::QueueFull, "E_QUEUE_FULL" },
    timeout = { ErrorCode::CliTimeout, "E_CLI_TIMEOUT" },
    session_key = { ErrorCode::AdapterSessionKeyMissing, "E_ADAPTER_SESSION_KEY_MISSING" },
    not_retryable = { ErrorCode::JobNotRetryable, "E_JOB_NOT_RETRYABLE" },
    rate_limit = { ErrorCode::DiscordRateLimit, "E_DISCORD_RATE_LIMIT" },
)]
fn codes_are_stable(code: ErrorCode, expected: &str) {
    assert_eq!(code.as_str(), expected);
    assert_eq!(code.to_string(), expected);
}

#[test]
fn serde_round_trips_the_code_string() {
    let json = serde_json::to_string(&ErrorCode::ProjectExists).unwrap();
    assert_eq!(json, "\"E_PROJECT_EXISTS\"");
    let back: ErrorCode = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ErrorCode::ProjectExists);
}

#[test]
fn domain_error_displays_code_and_message() {
    let err = DomainError::new(ErrorCode::InvalidPath, "no such directory");
    assert_eq!(err.to_string(), "E_INVALID_PATH: no such directory");
}
