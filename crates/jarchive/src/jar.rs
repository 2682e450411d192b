//! Reads a JAR (or any zip-format archive) as a named collection of
//! entries, decoding `.class` members and `META-INF/MANIFEST.MF` on
//! demand rather than eagerly — most callers only need a handful of
//! entries out of a large archive.

use crate::error::ArchiveError;
use jclass::class_file::ClassFile;
use jclass::ParseOutcome;
use jmanifest::Manifest;
use std::io::{Cursor, Read};

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarEntryInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

pub struct JarReader {
    archive: zip::ZipArchive<Cursor<Vec<u8>>>,
    names: Vec<String>,
}

impl JarReader {
    pub fn open(bytes: Vec<u8>) -> Result<JarReader, ArchiveError> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let names = archive.file_names().map(|s| s.to_string()).collect();
        Ok(JarReader { archive, names })
    }

    /// Entry names in their original zip central-directory order — the
    /// order a differ should walk children in for determinism.
    pub fn entry_names(&self) -> &[String] {
        &self.names
    }

    pub fn entries(&mut self) -> Result<Vec<JarEntryInfo>, ArchiveError> {
        let mut infos = Vec::with_capacity(self.names.len());
        for name in self.names.clone() {
            let file = self.archive.by_name(&name)?;
            infos.push(JarEntryInfo { name, size: file.size(), is_dir: file.is_dir() });
        }
        Ok(infos)
    }

    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut file = self.archive.by_name(name).map_err(|_| ArchiveError::MissingEntry(name.to_string()))?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn read_class(&mut self, name: &str) -> Result<ParseOutcome, ArchiveError> {
        let bytes = self.read(name)?;
        Ok(ClassFile::parse_lenient(&bytes)?)
    }

    pub fn read_manifest(&mut self) -> Result<Option<Manifest>, ArchiveError> {
        if !self.contains(MANIFEST_PATH) {
            return Ok(None);
        }
        let bytes = self.read(MANIFEST_PATH)?;
        Ok(Some(Manifest::parse(&bytes)?))
    }

    /// Recomputes every per-entry digest the manifest declares and
    /// compares it against the entry's actual bytes in this archive.
    /// Returns the first mismatch found, naming the offending entry and
    /// digest algorithm; an archive with no manifest, or whose manifest
    /// declares no per-entry digests, trivially passes.
    pub fn verify_digests(&mut self) -> Result<(), ArchiveError> {
        let Some(manifest) = self.read_manifest()? else { return Ok(()) };
        let names: Vec<String> = manifest.entries.keys().cloned().collect();
        for name in names {
            let section = &manifest.entries[&name];
            let bytes = self.read(&name)?;
            for (header, expected) in &section.headers {
                let Some(algorithm) = jmanifest::DigestAlgorithm::from_header_name(header) else { continue };
                if !jmanifest::verify_digest(algorithm, &bytes, expected)? {
                    return Err(ArchiveError::Manifest(jmanifest::ManifestError::DigestMismatch {
                        entry: name.clone(),
                        algorithm: header.clone(),
                    }));
                }
            }
        }
        Ok(())
    }

    /// Every `.class` entry name, in archive order.
    pub fn class_entry_names(&self) -> Vec<&str> {
        self.names.iter().filter(|n| n.ends_with(".class")).map(|s| s.as_str()).collect()
    }

    /// Nested `.jar`/`.war`/`.ear` archives embedded directly in this one,
    /// such as a `WEB-INF/lib/*.jar` inside a web application archive.
    pub fn nested_archive_names(&self) -> Vec<&str> {
        self.names.iter().filter(|n| n.ends_with(".jar") || n.ends_with(".war") || n.ends_with(".ear")).map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_test_jar() -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
            writer.start_file(MANIFEST_PATH, options).unwrap();
            writer.write_all(b"Manifest-Version: 1.0\r\n").unwrap();
            writer.start_file("com/acme/Widget.class", options).unwrap();
            writer.write_all(b"not really a class file").unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn reads_manifest_and_lists_class_entries() {
        let mut reader = JarReader::open(build_test_jar()).unwrap();
        let manifest = reader.read_manifest().unwrap().unwrap();
        assert_eq!(manifest.main.get("Manifest-Version"), Some("1.0"));
        assert_eq!(reader.class_entry_names(), vec!["com/acme/Widget.class"]);
    }

    #[test]
    fn missing_entry_is_reported() {
        let mut reader = JarReader::open(build_test_jar()).unwrap();
        assert!(matches!(reader.read("does/not/Exist.class"), Err(ArchiveError::MissingEntry(_))));
    }

    fn build_jar_with_digest(entry_name: &str, entry_bytes: &[u8], declared_bytes: &[u8]) -> Vec<u8> {
        let digest = jmanifest::compute_digest(jmanifest::DigestAlgorithm::Sha256, declared_bytes);
        let manifest = format!("Manifest-Version: 1.0\r\n\r\nName: {entry_name}\r\nSHA-256-Digest: {digest}\r\n\r\n");
        let mut buf = Vec::new();
        let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file(MANIFEST_PATH, options).unwrap();
        writer.write_all(manifest.as_bytes()).unwrap();
        writer.start_file(entry_name, options).unwrap();
        writer.write_all(entry_bytes).unwrap();
        writer.finish().unwrap();
        buf
    }

    #[test]
    fn verify_digests_passes_when_entry_matches_manifest() {
        let bytes = build_jar_with_digest("com/acme/Widget.class", b"class bytes", b"class bytes");
        let mut reader = JarReader::open(bytes).unwrap();
        assert!(reader.verify_digests().is_ok());
    }

    #[test]
    fn verify_digests_names_the_tampered_entry() {
        let bytes = build_jar_with_digest("com/acme/Widget.class", b"tampered bytes", b"class bytes");
        let mut reader = JarReader::open(bytes).unwrap();
        let err = reader.verify_digests().unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Manifest(jmanifest::ManifestError::DigestMismatch { entry, .. }) if entry == "com/acme/Widget.class"
        ));
    }
}
