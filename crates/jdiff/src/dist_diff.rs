//! Compares two distribution trees: every loose `.class` file and every
//! JAR found by walking each root. A JAR present on both sides is opened
//! and diffed with [`jar_diff::diff_jar`]; a loose class is decoded and
//! diffed with [`class_diff::diff_class`]; a loose resource file goes
//! through [`resource_diff::diff_resource`] the same way a JAR entry
//! would. A nested JAR-in-a-JAR is compared only by presence — this
//! crate doesn't open an archive nested inside another archive.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use jarchive::{ArchiveError, DistEntryKind, DistWalker};
use jclass::cancel::{CancelToken, NeverCancel};
use jclass::ClassFile;

use crate::class_diff::diff_class;
use crate::delta::{ChangeKind, Delta};
use crate::jar_diff::diff_jar;
use crate::resource_diff::diff_resource;

fn read_loose_class(root: &Path, relative_path: &str) -> Option<ClassFile> {
    let bytes = fs::read(root.join(relative_path)).ok()?;
    ClassFile::parse_lenient(&bytes).ok().map(|outcome| outcome.class)
}

fn diff_entry(relative_path: &str, left_root: &Path, right_root: &Path, left_kind: Option<&DistEntryKind>, right_kind: Option<&DistEntryKind>) -> Delta {
    match (left_kind, right_kind) {
        (Some(DistEntryKind::Jar), Some(DistEntryKind::Jar)) => {
            let left_bytes = fs::read(left_root.join(relative_path));
            let right_bytes = fs::read(right_root.join(relative_path));
            match (left_bytes, right_bytes) {
                (Ok(lb), Ok(rb)) => match (jarchive::JarReader::open(lb), jarchive::JarReader::open(rb)) {
                    (Ok(mut l), Ok(mut r)) => match diff_jar(&mut l, &mut r) {
                        Ok(mut delta) => {
                            delta.children = delta_retagged_as(relative_path, delta.children);
                            delta
                        }
                        Err(_) => Delta::leaf("jar", ChangeKind::Modified, relative_path, relative_path),
                    },
                    _ => Delta::leaf("jar", ChangeKind::Modified, relative_path, relative_path),
                },
                _ => Delta::leaf("jar", ChangeKind::Modified, relative_path, relative_path),
            }
        }
        (Some(DistEntryKind::LooseClass), Some(DistEntryKind::LooseClass)) => {
            let left_class = read_loose_class(left_root, relative_path);
            let right_class = read_loose_class(right_root, relative_path);
            diff_class(left_class.as_ref(), right_class.as_ref())
        }
        (Some(DistEntryKind::Resource), Some(DistEntryKind::Resource)) => {
            let left_bytes = fs::read(left_root.join(relative_path)).ok();
            let right_bytes = fs::read(right_root.join(relative_path)).ok();
            diff_resource(relative_path, relative_path, left_bytes.as_deref(), right_bytes.as_deref())
        }
        (Some(l), Some(r)) if l == r => Delta::leaf("entry", ChangeKind::Unchanged, relative_path, relative_path),
        (Some(_), Some(_)) => Delta::leaf("entry", ChangeKind::Modified, relative_path, relative_path),
        (Some(_), None) => Delta::leaf("entry", ChangeKind::Removed, relative_path, relative_path),
        (None, Some(_)) => Delta::leaf("entry", ChangeKind::Added, relative_path, relative_path),
        (None, None) => unreachable!("diff_entry called with neither side present"),
    }
}

/// Rewrites `id` to be rooted at the entry's path so a JAR's internal
/// children remain addressable within the whole-distribution tree.
fn delta_retagged_as(relative_path: &str, children: Vec<Delta>) -> Vec<Delta> {
    children
        .into_iter()
        .map(|mut child| {
            child.id = format!("{relative_path}::{}", child.id);
            child
        })
        .collect()
}

/// Compares two distribution roots on disk and produces a `Delta` tree
/// rooted at `kind = "distribution"`, with one child per relative path
/// observed on either side.
pub fn diff_distribution(left_root: &Path, right_root: &Path) -> Result<Delta, ArchiveError> {
    diff_distribution_with_cancel(left_root, right_root, &NeverCancel)
}

/// Like [`diff_distribution`], but checks `cancel` once per entry found on
/// either root.
pub fn diff_distribution_with_cancel(left_root: &Path, right_root: &Path, cancel: &dyn CancelToken) -> Result<Delta, ArchiveError> {
    let left_entries = DistWalker::new(left_root).walk()?;
    let right_entries = DistWalker::new(right_root).walk()?;

    let left_by_path: BTreeMap<&str, &DistEntryKind> = left_entries.iter().map(|e| (e.relative_path.as_str(), &e.kind)).collect();
    let right_by_path: BTreeMap<&str, &DistEntryKind> = right_entries.iter().map(|e| (e.relative_path.as_str(), &e.kind)).collect();

    let mut paths: Vec<&str> = left_by_path.keys().chain(right_by_path.keys()).copied().collect();
    paths.sort_unstable();
    paths.dedup();

    let mut children = Vec::with_capacity(paths.len());
    for path in paths {
        cancel.check()?;
        children.push(diff_entry(path, left_root, right_root, left_by_path.get(path).copied(), right_by_path.get(path).copied()));
    }

    let overall = if children.iter().any(Delta::has_effective_change) { ChangeKind::Modified } else { ChangeKind::Unchanged };
    Ok(Delta::leaf("distribution", overall, "distribution", "distribution").with_children(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tempdir() -> std::path::PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let mut dir = std::env::temp_dir();
        dir.push(format!("jdiff-dist-test-{}-{id}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn identical_resource_trees_are_unchanged() {
        let left = tempdir();
        let right = tempdir();
        fs::write(left.join("README.txt"), b"hello").unwrap();
        fs::write(right.join("README.txt"), b"hello").unwrap();
        let delta = diff_distribution(&left, &right).unwrap();
        assert_eq!(delta.change, ChangeKind::Unchanged);
    }

    #[test]
    fn file_present_only_on_one_side_is_added_or_removed() {
        let left = tempdir();
        let right = tempdir();
        fs::write(left.join("only-left.txt"), b"hello").unwrap();
        let delta = diff_distribution(&left, &right).unwrap();
        assert!(delta.children.iter().any(|c| c.change == ChangeKind::Removed));
    }

    #[test]
    fn diff_distribution_with_cancel_reports_cancelled() {
        let left = tempdir();
        let right = tempdir();
        fs::write(left.join("a.txt"), b"hello").unwrap();
        fs::write(right.join("a.txt"), b"hello").unwrap();
        let flag = jclass::cancel::Flag::new();
        flag.cancel();
        assert!(matches!(diff_distribution_with_cancel(&left, &right, &flag), Err(ArchiveError::Decode(jclass::DecodeError::Cancelled))));
    }

    #[test]
    fn changed_resource_content_is_reported() {
        let left = tempdir();
        let right = tempdir();
        fs::write(left.join("app.properties"), b"debug=false").unwrap();
        fs::write(right.join("app.properties"), b"debug=true").unwrap();
        let delta = diff_distribution(&left, &right).unwrap();
        assert_eq!(delta.change, ChangeKind::Modified);
        let entry = delta.children.iter().find(|c| c.id == "app.properties").unwrap();
        assert_eq!(entry.kind, "resource_text");
    }
}
