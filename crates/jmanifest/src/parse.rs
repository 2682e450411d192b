//! [JAR Manifest grammar](https://docs.oracle.com/en/java/javase/17/docs/specs/jar/jar.html#jar-manifest)
//!
//! A manifest is a sequence of `Name: value` headers, wrapped at 72 bytes
//! with a single leading space marking a continuation line, grouped into
//! a main section followed by per-entry sections separated by a blank
//! line. Header order within a section is preserved — `IndexMap` rather
//! than a sorted map, since re-emitting a manifest in a different header
//! order than it was written in would itself look like a change to a
//! differ even when no value actually changed.

use crate::error::ManifestError;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub headers: IndexMap<String, String>,
}

impl Section {
    /// Header names are case-insensitive per the manifest grammar; this
    /// falls back to a case-insensitive scan rather than requiring every
    /// caller to normalize the name it looks up.
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.headers.get(name) {
            return Some(value.as_str());
        }
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub main: Section,
    /// Per-entry sections keyed by their `Name` header, in file order.
    pub entries: IndexMap<String, Section>,
}

impl Manifest {
    pub fn parse(bytes: &[u8]) -> Result<Manifest, ManifestError> {
        let text = String::from_utf8_lossy(bytes);
        let logical_lines = join_continuations(&text)?;
        let mut sections = split_sections(&logical_lines);

        let main = sections.next().map(parse_section_headers).transpose()?.unwrap_or_default();
        let mut entries = IndexMap::new();
        for raw in sections {
            let section = parse_section_headers(raw)?;
            if let Some(name) = section.get("Name") {
                entries.insert(name.to_string(), section);
            }
        }
        Ok(Manifest { main, entries })
    }
}

struct LogicalLine {
    line_number: usize,
    text: String,
}

fn join_continuations(text: &str) -> Result<Vec<LogicalLine>, ManifestError> {
    let mut logical = Vec::new();
    for (i, raw_line) in text.lines().enumerate() {
        let line_number = i + 1;
        if let Some(rest) = raw_line.strip_prefix(' ') {
            let last = logical.last_mut().ok_or(ManifestError::DanglingContinuation { line: line_number })?;
            let last: &mut LogicalLine = last;
            last.text.push_str(rest);
        } else if raw_line.is_empty() {
            logical.push(LogicalLine { line_number, text: String::new() });
        } else {
            logical.push(LogicalLine { line_number, text: raw_line.to_string() });
        }
    }
    Ok(logical)
}

fn split_sections(lines: &[LogicalLine]) -> impl Iterator<Item = &[LogicalLine]> {
    let mut sections = Vec::new();
    let mut start = 0;
    for (i, line) in lines.iter().enumerate() {
        if line.text.is_empty() {
            if i > start {
                sections.push(&lines[start..i]);
            }
            start = i + 1;
        }
    }
    if start < lines.len() {
        sections.push(&lines[start..]);
    }
    sections.into_iter()
}

fn parse_section_headers(lines: &[LogicalLine]) -> Result<Section, ManifestError> {
    let mut headers = IndexMap::new();
    for line in lines {
        let Some((name, value)) = line.text.split_once(": ") else {
            return Err(ManifestError::MalformedLine { line: line.line_number, text: line.text.clone() });
        };
        if name.is_empty() {
            return Err(ManifestError::EmptyHeaderName { line: line.line_number });
        }
        headers.insert(name.to_string(), value.to_string());
    }
    Ok(Section { headers })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_main_section_only() {
        let data = b"Manifest-Version: 1.0\r\nCreated-By: 17 (Eclipse Adoptium)\r\n";
        let manifest = Manifest::parse(data).unwrap();
        assert_eq!(manifest.main.get("Manifest-Version"), Some("1.0"));
        assert!(manifest.entries.is_empty());
    }

    #[test]
    fn joins_continuation_lines() {
        let data = b"Manifest-Version: 1.0\r\nLong-Header: this is a very\r\n long value split acr\r\noss lines\r\n";
        let manifest = Manifest::parse(data).unwrap();
        assert_eq!(manifest.main.get("Long-Header"), Some("this is a very long value split across lines"));
    }

    #[test]
    fn parses_per_entry_sections() {
        let data = b"Manifest-Version: 1.0\r\n\r\nName: com/acme/Widget.class\r\nSHA-256-Digest: abc123\r\n\r\nName: com/acme/Other.class\r\nSHA-256-Digest: def456\r\n";
        let manifest = Manifest::parse(data).unwrap();
        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.entries["com/acme/Widget.class"].get("SHA-256-Digest"), Some("abc123"));
        let keys: Vec<&str> = manifest.entries.keys().map(|s| s.as_str()).collect();
        assert_eq!(keys, vec!["com/acme/Widget.class", "com/acme/Other.class"]);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let data = b"manifest-version: 1.0\r\n";
        let manifest = Manifest::parse(data).unwrap();
        assert_eq!(manifest.main.get("Manifest-Version"), Some("1.0"));
    }

    #[test]
    fn dangling_continuation_is_an_error() {
        let data = b" leading continuation with no header\r\n";
        assert_eq!(Manifest::parse(data), Err(ManifestError::DanglingContinuation { line: 1 }));
    }

    #[test]
    fn malformed_line_is_an_error() {
        let data = b"not-a-header-line\r\n";
        assert!(matches!(Manifest::parse(data), Err(ManifestError::MalformedLine { .. })));
    }
}
