//! Compares two JARs: their manifests, every class entry they carry in
//! common, added, or removed, and every other archive entry. Signature
//! files (`META-INF/*.SF`, `META-INF/*.RSA`/`.DSA`) are compared as a
//! single opaque node so the `jar_signature` ignore token can suppress
//! the whole thing at once — re-signing an otherwise-identical JAR is
//! noise for most callers. Everything left over (not the manifest, not a
//! class, not a signature file) goes through [`resource_diff`] for a
//! line-diff or content-hash comparison depending on whether it looks
//! like text.

use std::collections::BTreeSet;

use jarchive::jar::MANIFEST_PATH;
use jarchive::{ArchiveError, JarReader};
use jclass::cancel::{CancelToken, NeverCancel};
use jmanifest::{Manifest, Section};

use crate::class_diff::diff_class;
use crate::delta::{change_for_equality, ChangeKind, Delta};
use crate::resource_diff::diff_resource;

fn diff_section(id: &str, label: &str, left: Option<&Section>, right: Option<&Section>) -> Delta {
    match (left, right) {
        (Some(l), Some(r)) => {
            let mut children = Vec::new();
            let mut keys: Vec<&String> = l.headers.keys().chain(r.headers.keys()).collect();
            keys.sort_unstable();
            keys.dedup();
            for key in keys {
                let lv = l.get(key);
                let rv = r.get(key);
                let change = change_for_equality(&lv, &rv);
                if change != ChangeKind::Unchanged {
                    children.push(Delta::leaf("header", change, key.clone(), key.clone()).with_values(lv.map(str::to_string), rv.map(str::to_string)));
                }
            }
            let overall = if children.is_empty() { ChangeKind::Unchanged } else { ChangeKind::Modified };
            Delta::leaf("manifest_section", overall, id, label).with_children(children)
        }
        (Some(_), None) => Delta::leaf("manifest_section", ChangeKind::Removed, id, label),
        (None, Some(_)) => Delta::leaf("manifest_section", ChangeKind::Added, id, label),
        (None, None) => unreachable!("diff_section called with neither side present"),
    }
}

fn diff_manifest(left: Option<&Manifest>, right: Option<&Manifest>) -> Delta {
    match (left, right) {
        (None, None) => Delta::leaf("manifest", ChangeKind::Unchanged, "manifest", "MANIFEST.MF"),
        (Some(_), None) => Delta::leaf("manifest", ChangeKind::Removed, "manifest", "MANIFEST.MF"),
        (None, Some(_)) => Delta::leaf("manifest", ChangeKind::Added, "manifest", "MANIFEST.MF"),
        (Some(l), Some(r)) => {
            let mut children = vec![diff_section("manifest_main", "main section", Some(&l.main), Some(&r.main))];

            let mut names: Vec<&String> = l.entries.keys().chain(r.entries.keys()).collect();
            names.sort_unstable();
            names.dedup();
            for name in names {
                let id = format!("manifest_entry:{name}");
                children.push(diff_section(&id, name, l.entries.get(name), r.entries.get(name)));
            }

            let overall = if children.iter().any(Delta::has_effective_change) { ChangeKind::Modified } else { ChangeKind::Unchanged };
            Delta::leaf("manifest", overall, "manifest", "MANIFEST.MF").with_children(children)
        }
    }
}

fn is_signature_file(name: &str) -> bool {
    name.starts_with("META-INF/") && (name.ends_with(".SF") || name.ends_with(".RSA") || name.ends_with(".DSA"))
}

/// An entry this comparator hasn't already handled some other way: not a
/// directory, not the manifest itself, not a class (handled by the class
/// comparator), not a signature file (handled as one opaque node).
fn is_plain_resource(name: &str) -> bool {
    !name.ends_with('/') && name != MANIFEST_PATH && !name.ends_with(".class") && !is_signature_file(name)
}

fn diff_resources(left: &mut JarReader, right: &mut JarReader) -> Result<Vec<Delta>, ArchiveError> {
    let left_names: BTreeSet<String> = left.entry_names().iter().filter(|n| is_plain_resource(n)).cloned().collect();
    let right_names: BTreeSet<String> = right.entry_names().iter().filter(|n| is_plain_resource(n)).cloned().collect();
    let mut names: BTreeSet<String> = left_names.clone();
    names.extend(right_names.clone());

    let mut children = Vec::with_capacity(names.len());
    for name in names {
        let left_bytes = if left_names.contains(&name) { Some(left.read(&name)?) } else { None };
        let right_bytes = if right_names.contains(&name) { Some(right.read(&name)?) } else { None };
        children.push(diff_resource(&name, &name, left_bytes.as_deref(), right_bytes.as_deref()));
    }
    Ok(children)
}

fn diff_signature_files(left: &mut JarReader, right: &mut JarReader) -> Delta {
    let left_names: BTreeSet<String> = left.entry_names().iter().filter(|n| is_signature_file(n)).cloned().collect();
    let right_names: BTreeSet<String> = right.entry_names().iter().filter(|n| is_signature_file(n)).cloned().collect();

    if left_names.is_empty() && right_names.is_empty() {
        return Delta::leaf("jar_signature", ChangeKind::Unchanged, "jar_signature", "signature files");
    }

    let names_match = left_names == right_names;
    let mut bytes_match = names_match;
    if names_match {
        for name in &left_names {
            let l = left.read(name).ok();
            let r = right.read(name).ok();
            if l != r {
                bytes_match = false;
                break;
            }
        }
    }

    let change = if bytes_match { ChangeKind::Unchanged } else { ChangeKind::Modified };
    Delta::leaf("jar_signature", change, "jar_signature", "signature files")
        .with_values(Some(format!("{left_names:?}")), Some(format!("{right_names:?}")))
}

/// Compares two JARs already loaded into memory. Class entries are
/// matched by their `.class` path; any entry that fails to decode on
/// either side is reported as a whole-class modification rather than
/// aborting the comparison, since one unreadable class shouldn't stop a
/// differ from reporting on the rest of the archive.
pub fn diff_jar(left: &mut JarReader, right: &mut JarReader) -> Result<Delta, ArchiveError> {
    diff_jar_impl(left, right, &NeverCancel)
}

/// Like [`diff_jar`], but checks `cancel` once per compared class pair.
pub fn diff_jar_with_cancel(left: &mut JarReader, right: &mut JarReader, cancel: &dyn CancelToken) -> Result<Delta, ArchiveError> {
    diff_jar_impl(left, right, cancel)
}

fn diff_jar_impl(left: &mut JarReader, right: &mut JarReader, cancel: &dyn CancelToken) -> Result<Delta, ArchiveError> {
    let mut children = Vec::new();

    let left_manifest = left.read_manifest()?;
    let right_manifest = right.read_manifest()?;
    children.push(diff_manifest(left_manifest.as_ref(), right_manifest.as_ref()));

    let left_classes: BTreeSet<String> = left.class_entry_names().into_iter().map(str::to_string).collect();
    let right_classes: BTreeSet<String> = right.class_entry_names().into_iter().map(str::to_string).collect();
    let mut names: BTreeSet<String> = left_classes.clone();
    names.extend(right_classes.clone());

    for name in names {
        cancel.check()?;
        let left_outcome = if left_classes.contains(&name) { Some(left.read_class(&name)?) } else { None };
        let right_outcome = if right_classes.contains(&name) { Some(right.read_class(&name)?) } else { None };
        children.push(diff_class(left_outcome.as_ref().map(|o| &o.class), right_outcome.as_ref().map(|o| &o.class)));
    }

    children.push(diff_signature_files(left, right));
    children.extend(diff_resources(left, right)?);

    let overall = if children.iter().any(Delta::has_effective_change) { ChangeKind::Modified } else { ChangeKind::Unchanged };
    Ok(Delta::leaf("jar", overall, "jar", "jar").with_children(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn build_jar(manifest: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
            writer.start_file("META-INF/MANIFEST.MF", options).unwrap();
            writer.write_all(manifest.as_bytes()).unwrap();
            for (name, data) in files {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn identical_jars_are_unchanged() {
        let bytes = build_jar("Manifest-Version: 1.0\r\n\r\n", &[]);
        let mut left = JarReader::open(bytes.clone()).unwrap();
        let mut right = JarReader::open(bytes).unwrap();
        let delta = diff_jar(&mut left, &mut right).unwrap();
        assert_eq!(delta.change, ChangeKind::Unchanged);
    }

    #[test]
    fn manifest_header_change_is_detected() {
        let left_bytes = build_jar("Manifest-Version: 1.0\r\n\r\n", &[]);
        let right_bytes = build_jar("Manifest-Version: 2.0\r\n\r\n", &[]);
        let mut left = JarReader::open(left_bytes).unwrap();
        let mut right = JarReader::open(right_bytes).unwrap();
        let delta = diff_jar(&mut left, &mut right).unwrap();
        assert_eq!(delta.change, ChangeKind::Modified);
    }

    #[test]
    fn changed_text_resource_surfaces_as_a_resource_text_child() {
        let left_bytes = build_jar("Manifest-Version: 1.0\r\n\r\n", &[("application.properties", b"debug=false")]);
        let right_bytes = build_jar("Manifest-Version: 1.0\r\n\r\n", &[("application.properties", b"debug=true")]);
        let mut left = JarReader::open(left_bytes).unwrap();
        let mut right = JarReader::open(right_bytes).unwrap();
        let delta = diff_jar(&mut left, &mut right).unwrap();
        assert_eq!(delta.change, ChangeKind::Modified);
        assert!(delta.children.iter().any(|c| c.kind == "resource_text" && c.id == "application.properties"));
    }

    #[test]
    fn diff_jar_with_cancel_reports_cancelled() {
        let bytes = build_jar("Manifest-Version: 1.0\r\n\r\n", &[("a.class", b"")]);
        let mut left = JarReader::open(bytes.clone()).unwrap();
        let mut right = JarReader::open(bytes).unwrap();
        let flag = jclass::cancel::Flag::new();
        flag.cancel();
        assert!(matches!(diff_jar_with_cancel(&mut left, &mut right, &flag), Err(ArchiveError::Decode(jclass::DecodeError::Cancelled))));
    }

    #[test]
    fn identical_resources_do_not_appear_as_changes() {
        let left_bytes = build_jar("Manifest-Version: 1.0\r\n\r\n", &[("logo.png", &[0x89, b'P', b'N', b'G'])]);
        let right_bytes = build_jar("Manifest-Version: 1.0\r\n\r\n", &[("logo.png", &[0x89, b'P', b'N', b'G'])]);
        let mut left = JarReader::open(left_bytes).unwrap();
        let mut right = JarReader::open(right_bytes).unwrap();
        let delta = diff_jar(&mut left, &mut right).unwrap();
        assert_eq!(delta.change, ChangeKind::Unchanged);
    }
}
