// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared plumbing for the three stream dialects.

use serde_json::Value;

/// Cheap pre-filter before attempting a JSON parse: a trimmed line that
/// starts with `{` and ends with `}`. Lines failing this are diagnostics,
/// never errors.
pub fn looks_like_json_object(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Assistant-text assembly in document order.
///
/// Some tools emit both delta and final-consolidated text for the same
/// content; a chunk equal to the last appended chunk is dropped.
#[derive(Debug, Default)]
pub struct TextAccumulator {
    chunks: Vec<String>,
}

impl TextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        if self.chunks.last().map(String::as_str) == Some(chunk) {
            return;
        }
        self.chunks.push(chunk.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn join(&self, sep: &str) -> String {
        self.chunks.join(sep)
    }
}

/// Keys probed by [`extract_text`], in priority order.
const TEXT_KEYS: [&str; 5] = ["text", "content", "message", "response", "delta"];

/// Generic best-effort text extraction from a dialect event.
///
/// Probes the conventional keys; a string wins outright, a nested object is
/// probed recursively.
pub fn extract_text(value: &Value) -> Option<String> {
    for key in TEXT_KEYS {
        match value.get(key) {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(nested @ Value::Object(_)) => {
                if let Some(found) = extract_text(nested) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

/// Top-level string field, if present.
pub fn top_level_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
