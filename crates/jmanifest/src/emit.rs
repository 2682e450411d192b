//! Serializes a [`Manifest`] back to its wire form: CRLF line endings, and
//! any line whose UTF-8 byte length would exceed 72 bytes wrapped onto a
//! continuation line with a single leading space.

use crate::parse::{Manifest, Section};

const MAX_LINE_BYTES: usize = 72;

pub fn emit(manifest: &Manifest) -> Vec<u8> {
    let mut out = String::new();
    emit_section(&manifest.main, &mut out);
    for section in manifest.entries.values() {
        out.push_str("\r\n");
        emit_section(section, &mut out);
    }
    out.into_bytes()
}

fn emit_section(section: &Section, out: &mut String) {
    for (name, value) in &section.headers {
        emit_header_line(name, value, out);
    }
}

fn emit_header_line(name: &str, value: &str, out: &mut String) {
    let full = format!("{name}: {value}");
    let bytes = full.as_bytes();
    if bytes.len() <= MAX_LINE_BYTES {
        out.push_str(&full);
        out.push_str("\r\n");
        return;
    }
    // wrap at a UTF-8 char boundary at or before MAX_LINE_BYTES; continuation
    // lines reserve one byte for their leading space, so they carry one less.
    let mut remaining = full.as_str();
    let mut first = true;
    while !remaining.is_empty() {
        let budget = if first { MAX_LINE_BYTES } else { MAX_LINE_BYTES - 1 };
        let mut split_at = remaining.len().min(budget);
        while split_at > 0 && !remaining.is_char_boundary(split_at) {
            split_at -= 1;
        }
        if split_at == 0 {
            split_at = remaining.chars().next().map(char::len_utf8).unwrap_or(remaining.len());
        }
        let (chunk, rest) = remaining.split_at(split_at);
        if !first {
            out.push(' ');
        }
        out.push_str(chunk);
        out.push_str("\r\n");
        remaining = rest;
        first = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Manifest;

    #[test]
    fn round_trips_through_parse() {
        let data = b"Manifest-Version: 1.0\r\n\r\nName: com/acme/Widget.class\r\nSHA-256-Digest: abc123\r\n";
        let manifest = Manifest::parse(data).unwrap();
        let emitted = emit(&manifest);
        let reparsed = Manifest::parse(&emitted).unwrap();
        assert_eq!(manifest, reparsed);
    }

    #[test]
    fn wraps_long_header_values_at_72_bytes() {
        let mut section = Section::default();
        let long_value = "x".repeat(100);
        section.headers.insert("SHA-256-Digest".to_string(), long_value.clone());
        let mut out = String::new();
        emit_section(&section, &mut out);
        for line in out.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(line.len() <= MAX_LINE_BYTES, "line exceeded 72 bytes: {line:?}");
        }
        assert!(out.contains("\r\n "), "expected at least one continuation line");
    }
}
