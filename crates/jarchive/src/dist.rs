//! Walks a distribution directory tree (an exploded application, a set of
//! JARs dropped in a `lib/` folder) and classifies each file it finds.
//! Nested JARs are walked one level deep; a JAR found inside another JAR
//! is recorded but not recursed into further, since build pipelines
//! occasionally ship a JAR-in-a-JAR as an opaque resource and walking it
//! as code would misclassify a deliberately opaque artifact.

use crate::error::ArchiveError;
use crate::jar::JarReader;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistEntryKind {
    LooseClass,
    Jar,
    /// A JAR discovered while already inside another JAR; tracked as an
    /// opaque member, not opened.
    NestedJarInJar,
    Resource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistEntry {
    pub relative_path: String,
    pub kind: DistEntryKind,
}

pub struct DistWalker {
    root: PathBuf,
}

impl DistWalker {
    pub fn new(root: impl Into<PathBuf>) -> DistWalker {
        DistWalker { root: root.into() }
    }

    pub fn walk(&self) -> Result<Vec<DistEntry>, ArchiveError> {
        let mut entries = Vec::new();
        for dir_entry in WalkDir::new(&self.root).sort_by_file_name() {
            let dir_entry = dir_entry.map_err(|e| ArchiveError::Io(e.into()))?;
            if dir_entry.file_type().is_dir() {
                continue;
            }
            let path = dir_entry.path();
            let relative_path = path.strip_prefix(&self.root).unwrap_or(path).to_string_lossy().replace('\\', "/");
            let kind = classify(path);
            entries.push(DistEntry { relative_path, kind });
        }
        Ok(entries)
    }

    /// Opens every top-level JAR found during the walk and lists the
    /// nested JARs each one carries, without opening those nested JARs.
    pub fn walk_with_nested_jars(&self) -> Result<Vec<(DistEntry, Vec<String>)>, ArchiveError> {
        let mut results = Vec::new();
        for entry in self.walk()? {
            if entry.kind == DistEntryKind::Jar {
                let full_path = self.root.join(&entry.relative_path);
                let bytes = fs::read(&full_path)?;
                let reader = JarReader::open(bytes)?;
                let nested: Vec<String> = reader.nested_archive_names().into_iter().map(|s| s.to_string()).collect();
                results.push((entry, nested));
            } else {
                results.push((entry, vec![]));
            }
        }
        Ok(results)
    }
}

fn classify(path: &Path) -> DistEntryKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some("class") => DistEntryKind::LooseClass,
        Some("jar") | Some("war") | Some("ear") => DistEntryKind::Jar,
        _ => DistEntryKind::Resource,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn classifies_loose_class_and_resource_files() {
        let dir = tempdir();
        fs::create_dir_all(dir.join("com/acme")).unwrap();
        fs::write(dir.join("com/acme/Widget.class"), b"").unwrap();
        fs::write(dir.join("README.txt"), b"hello").unwrap();
        let walker = DistWalker::new(&dir);
        let entries = walker.walk().unwrap();
        let kinds: Vec<_> = entries.iter().map(|e| (e.relative_path.clone(), e.kind.clone())).collect();
        assert!(kinds.contains(&("README.txt".to_string(), DistEntryKind::Resource)));
        assert!(kinds.contains(&("com/acme/Widget.class".to_string(), DistEntryKind::LooseClass)));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn classifies_jar_and_its_nested_jar_without_opening_it() {
        let dir = tempdir();
        let inner_jar = build_minimal_jar();
        let mut outer_buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut outer_buf));
            let options = zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
            writer.start_file("lib/inner.jar", options).unwrap();
            writer.write_all(&inner_jar).unwrap();
            writer.finish().unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("outer.jar"), &outer_buf).unwrap();
        let walker = DistWalker::new(&dir);
        let results = walker.walk_with_nested_jars().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.kind, DistEntryKind::Jar);
        assert_eq!(results[0].1, vec!["lib/inner.jar".to_string()]);
        fs::remove_dir_all(&dir).ok();
    }

    fn build_minimal_jar() -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        let options = zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("META-INF/MANIFEST.MF", options).unwrap();
        writer.write_all(b"Manifest-Version: 1.0\r\n").unwrap();
        writer.finish().unwrap();
        buf
    }

    fn tempdir() -> PathBuf {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let mut dir = std::env::temp_dir();
        dir.push(format!("jarchive-dist-test-{}-{id}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}
