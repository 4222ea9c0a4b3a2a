// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn collect(chunks: &[&[u8]]) -> Vec<String> {
    let mut buf = LineBuffer::new();
    let mut lines = Vec::new();
    for chunk in chunks {
        buf.push(chunk, |l| lines.push(l));
    }
    buf.finish(|l| lines.push(l));
    lines
}

#[test]
fn splits_on_newline() {
    assert_eq!(collect(&[b"a\nb\n"]), ["a", "b"]);
}

#[test]
fn strips_crlf() {
    assert_eq!(collect(&[b"a\r\nb\r\n"]), ["a", "b"]);
}

#[test]
fn reassembles_lines_split_across_chunks() {
    assert_eq!(collect(&[b"hel", b"lo\nwor", b"ld\n"]), ["hello", "world"]);
}

#[test]
fn newline_split_from_carriage_return() {
    assert_eq!(collect(&[b"a\r", b"\nb\n"]), ["a", "b"]);
}

#[test]
fn finish_flushes_trailing_fragment() {
    assert_eq!(collect(&[b"no newline"]), ["no newline"]);
}

#[test]
fn finish_emits_nothing_when_empty() {
    assert_eq!(collect(&[b"done\n"]), ["done"]);
}

#[test]
fn invalid_utf8_is_replaced_not_dropped() {
    let lines = collect(&[b"ok\n\xff\xfe\n"]);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "ok");
    assert!(!lines[1].is_empty());
}
