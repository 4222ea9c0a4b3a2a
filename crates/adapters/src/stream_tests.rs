// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    object = { r#"{"type":"x"}"#, true },
    padded = { r#"  {"type":"x"}  "#, true },
    array = { r#"["a"]"#, false },
    prose = { "Loading model...", false },
    open_only = { r#"{"unterminated":"#, false },
    empty = { "", false },
)]
fn json_object_heuristic(line: &str, expected: bool) {
    assert_eq!(looks_like_json_object(line), expected);
}

#[test]
fn accumulator_drops_consecutive_duplicates_only() {
    let mut acc = TextAccumulator::new();
    acc.push("a");
    acc.push("a");
    acc.push("b");
    acc.push("a");
    assert_eq!(acc.join("\n"), "a\nb\na");
}

#[test]
fn accumulator_ignores_empty_chunks() {
    let mut acc = TextAccumulator::new();
    acc.push("");
    assert!(acc.is_empty());
}

#[test]
fn extract_text_prefers_earlier_keys() {
    let value = json!({"delta": "d", "text": "t"});
    assert_eq!(extract_text(&value).as_deref(), Some("t"));
}

#[test]
fn extract_text_recurses_into_objects() {
    let value = json!({"message": {"content": "nested"}});
    assert_eq!(extract_text(&value).as_deref(), Some("nested"));
}

#[test]
fn extract_text_misses_cleanly() {
    let value = json!({"type": "noise", "n": 3});
    assert_eq!(extract_text(&value), None);
}
