//! Compares a single non-class, non-manifest resource found in a JAR or a
//! distribution tree. A resource that decodes as UTF-8 and carries no NUL
//! bytes is treated as text and line-diffed; anything else is compared by
//! content hash, since there's no useful way to show a "diff" of an image
//! or a compiled native library.

use sha2::{Digest, Sha256};

use crate::delta::{ChangeKind, Delta};

fn is_probably_text(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_ok() && !bytes.contains(&0)
}

fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Compares two resource entries by content. Either side may be absent,
/// representing a resource present in only one of the two archives or
/// trees being compared.
pub fn diff_resource(id: &str, label: &str, left: Option<&[u8]>, right: Option<&[u8]>) -> Delta {
    match (left, right) {
        (Some(l), Some(r)) => {
            if l == r {
                return Delta::leaf("resource", ChangeKind::Unchanged, id, label);
            }
            if is_probably_text(l) && is_probably_text(r) {
                diff_text_resource(id, label, l, r)
            } else {
                diff_binary_resource(id, label, l, r)
            }
        }
        (Some(_), None) => Delta::leaf("resource", ChangeKind::Removed, id, label),
        (None, Some(_)) => Delta::leaf("resource", ChangeKind::Added, id, label),
        (None, None) => unreachable!("diff_resource called with neither side present"),
    }
}

/// A text resource whose only difference is line-ending style (`\r\n` vs
/// `\n`) is reported as a single `line_ending` child rather than a line
/// for every line in the file, so the `platform` ignore token can
/// suppress the whole thing at once.
fn diff_text_resource(id: &str, label: &str, l: &[u8], r: &[u8]) -> Delta {
    let left_text = String::from_utf8_lossy(l).into_owned();
    let right_text = String::from_utf8_lossy(r).into_owned();

    if left_text.replace("\r\n", "\n") == right_text.replace("\r\n", "\n") {
        let line_ending = Delta::leaf("line_ending", ChangeKind::Modified, "line_ending", "line endings")
            .with_values(Some(left_text), Some(right_text));
        return Delta::leaf("resource_text", ChangeKind::Modified, id, label).with_children(vec![line_ending]);
    }

    let left_lines: Vec<&str> = left_text.split('\n').collect();
    let right_lines: Vec<&str> = right_text.split('\n').collect();
    Delta::leaf("resource_text", ChangeKind::Modified, id, label).with_children(diff_line_sequence(&left_lines, &right_lines))
}

fn diff_line_sequence(left: &[&str], right: &[&str]) -> Vec<Delta> {
    let len = left.len().max(right.len());
    let mut children = Vec::new();
    for i in 0..len {
        let l = left.get(i);
        let r = right.get(i);
        let change = match (l, r) {
            (Some(a), Some(b)) if a == b => continue,
            (Some(_), Some(_)) => ChangeKind::Modified,
            (Some(_), None) => ChangeKind::Removed,
            (None, Some(_)) => ChangeKind::Added,
            (None, None) => continue,
        };
        children.push(
            Delta::leaf("line", change, format!("line#{i}"), format!("line {}", i + 1)).with_values(l.map(|s| s.to_string()), r.map(|s| s.to_string())),
        );
    }
    children
}

fn diff_binary_resource(id: &str, label: &str, l: &[u8], r: &[u8]) -> Delta {
    let left_hash = content_hash(l);
    let right_hash = content_hash(r);
    Delta::leaf("resource_binary", ChangeKind::Modified, id, label).with_values(Some(left_hash), Some(right_hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_are_unchanged() {
        let delta = diff_resource("README.txt", "README.txt", Some(b"hello"), Some(b"hello"));
        assert_eq!(delta.change, ChangeKind::Unchanged);
    }

    #[test]
    fn text_resource_line_diff_reports_changed_lines() {
        let delta = diff_resource("a.txt", "a.txt", Some(b"one\ntwo\nthree"), Some(b"one\nTWO\nthree"));
        assert_eq!(delta.change, ChangeKind::Modified);
        assert_eq!(delta.kind, "resource_text");
        assert!(delta.children.iter().any(|c| c.kind == "line" && c.change == ChangeKind::Modified));
    }

    #[test]
    fn line_ending_only_difference_collapses_to_one_child() {
        let delta = diff_resource("a.txt", "a.txt", Some(b"one\ntwo\n"), Some(b"one\r\ntwo\r\n"));
        assert_eq!(delta.kind, "resource_text");
        assert_eq!(delta.children.len(), 1);
        assert_eq!(delta.children[0].kind, "line_ending");
    }

    #[test]
    fn binary_resource_is_compared_by_hash() {
        let delta = diff_resource("lib.so", "lib.so", Some(&[0, 1, 2, 3]), Some(&[0, 1, 2, 4]));
        assert_eq!(delta.kind, "resource_binary");
        assert_eq!(delta.change, ChangeKind::Modified);
        assert_ne!(delta.left, delta.right);
    }

    #[test]
    fn only_present_on_left_is_removed() {
        let delta = diff_resource("a.txt", "a.txt", Some(b"hi"), None);
        assert_eq!(delta.change, ChangeKind::Removed);
    }
}
