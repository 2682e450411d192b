//! Signed-JAR verification: a `.SF` signature file whose own digests cover
//! sections of `MANIFEST.MF`, detached-signed with PKCS#7 in a
//! `.RSA`/`.DSA`/`.EC` signature block. The PKCS#7 step needs a real crypto
//! library, which this crate treats as optional: without the `crypto`
//! feature, verification always returns [`ManifestError::CryptoDisabled`]
//! rather than silently skipping the check.

use crate::digest::DigestAlgorithm;
use crate::error::ManifestError;
use crate::parse::Manifest;

/// Abstracts the PKCS#7 detached-signature verification step so the rest
/// of this crate doesn't need to know which crypto library, if any, is
/// compiled in.
pub trait CryptoBackend {
    fn verify_pkcs7_detached(&self, signed_data: &[u8], signature: &[u8], trust_anchor: Option<&[u8]>) -> Result<bool, ManifestError>;
}

pub struct NoCryptoBackend;

impl CryptoBackend for NoCryptoBackend {
    fn verify_pkcs7_detached(&self, _signed_data: &[u8], _signature: &[u8], _trust_anchor: Option<&[u8]>) -> Result<bool, ManifestError> {
        Err(ManifestError::CryptoDisabled)
    }
}

#[cfg(feature = "crypto")]
pub struct OpensslBackend;

#[cfg(feature = "crypto")]
impl CryptoBackend for OpensslBackend {
    fn verify_pkcs7_detached(&self, signed_data: &[u8], signature: &[u8], trust_anchor: Option<&[u8]>) -> Result<bool, ManifestError> {
        use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
        use openssl::stack::Stack;
        use openssl::x509::store::X509StoreBuilder;
        use openssl::x509::X509;

        let pkcs7 = Pkcs7::from_der(signature).map_err(|_| ManifestError::SignatureInvalid { entry: "signature block".to_string() })?;
        let mut store_builder =
            X509StoreBuilder::new().map_err(|_| ManifestError::SignatureInvalid { entry: "trust store".to_string() })?;
        if let Some(anchor) = trust_anchor {
            let cert = X509::from_der(anchor).map_err(|_| ManifestError::SignatureInvalid { entry: "trust anchor".to_string() })?;
            store_builder.add_cert(cert).ok();
        }
        let store = store_builder.build();
        let certs = Stack::new().map_err(|_| ManifestError::SignatureInvalid { entry: "certificate stack".to_string() })?;
        let mut output = Vec::new();
        let verified = pkcs7
            .verify(&certs, &store, Some(signed_data), Some(&mut output), Pkcs7Flags::NOINTERN | Pkcs7Flags::NOVERIFY)
            .is_ok();
        Ok(verified)
    }
}

/// An `.SF` file: whole-manifest digest headers plus one section per JAR
/// entry digesting that entry's manifest section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureFile {
    pub manifest: Manifest,
}

impl SignatureFile {
    pub fn parse(bytes: &[u8]) -> Result<SignatureFile, ManifestError> {
        Ok(SignatureFile { manifest: Manifest::parse(bytes)? })
    }

    /// Confirms every entry's manifest section still hashes to what the
    /// `.SF` file recorded, using whichever digest algorithm headers are
    /// present on that entry, and that the `.SF` main section's own
    /// `*-Digest-Manifest`/`*-Digest-Manifest-Main-Attributes` headers
    /// still match `manifest_bytes`.
    pub fn verify_against_manifest(&self, manifest_bytes: &[u8], manifest: &Manifest) -> Result<(), ManifestError> {
        for (header, expected) in &self.manifest.main.headers {
            if let Some(algorithm) = manifest_digest_algorithm(header, "-Digest-Manifest-Main-Attributes") {
                let main_attrs = main_attributes_bytes(manifest_bytes);
                if !crate::digest::verify(algorithm, main_attrs, expected)? {
                    return Err(ManifestError::SignatureInvalid { entry: "manifest main attributes".to_string() });
                }
            } else if let Some(algorithm) = manifest_digest_algorithm(header, "-Digest-Manifest") {
                if !crate::digest::verify(algorithm, manifest_bytes, expected)? {
                    return Err(ManifestError::SignatureInvalid { entry: "manifest".to_string() });
                }
            }
        }

        for (name, sf_section) in &self.manifest.entries {
            let manifest_section = manifest.entries.get(name).ok_or(ManifestError::MissingSection { section: name.clone() })?;
            for (header, expected) in &sf_section.headers {
                let Some(algorithm) = DigestAlgorithm::from_header_name(header) else { continue };
                let rendered = render_section_for_digest(name, manifest_section);
                if !crate::digest::verify(algorithm, &rendered, expected)? {
                    return Err(ManifestError::SignatureInvalid { entry: name.clone() });
                }
            }
        }
        Ok(())
    }
}

/// Matches a `.SF` main-section header like `SHA-256-Digest-Manifest` or
/// `SHA-256-Digest-Manifest-Main-Attributes` against one of the two whole-
/// manifest digest conventions and recovers the algorithm it names.
fn manifest_digest_algorithm(header: &str, suffix: &str) -> Option<DigestAlgorithm> {
    if header.len() <= suffix.len() || !header[header.len() - suffix.len()..].eq_ignore_ascii_case(suffix) {
        return None;
    }
    let prefix = &header[..header.len() - suffix.len()];
    DigestAlgorithm::from_header_name(&format!("{prefix}-Digest"))
}

/// The raw bytes of the manifest's main section, including the blank line
/// that separates it from the per-entry sections, matching the span
/// `jarsigner` digests for `*-Digest-Manifest-Main-Attributes`. A manifest
/// with no per-entry sections has no blank line, so the whole file is the
/// main section.
fn main_attributes_bytes(bytes: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < bytes.len() {
        let line_start = i;
        while i < bytes.len() && bytes[i] != b'\n' {
            i += 1;
        }
        let line_end_inclusive = if i < bytes.len() { i + 1 } else { i };
        let mut content_end = i;
        if content_end > line_start && bytes[content_end - 1] == b'\r' {
            content_end -= 1;
        }
        if content_end == line_start {
            return &bytes[..line_end_inclusive];
        }
        i = line_end_inclusive;
    }
    bytes
}

fn render_section_for_digest(name: &str, section: &crate::parse::Section) -> Vec<u8> {
    let mut out = format!("Name: {name}\r\n");
    for (header, value) in &section.headers {
        if header != "Name" {
            out.push_str(&format!("{header}: {value}\r\n"));
        }
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_crypto_backend_reports_disabled() {
        let backend = NoCryptoBackend;
        assert_eq!(backend.verify_pkcs7_detached(b"", b"", None), Err(ManifestError::CryptoDisabled));
    }

    fn sample_manifest_bytes() -> Vec<u8> {
        b"Manifest-Version: 1.0\r\nCreated-By: 17 (Eclipse Adoptium)\r\n\r\nName: com/acme/Widget.class\r\nSHA-256-Digest: entrydigest\r\n\r\n".to_vec()
    }

    #[test]
    fn main_attributes_bytes_stops_before_entry_sections() {
        let manifest_bytes = sample_manifest_bytes();
        let main = main_attributes_bytes(&manifest_bytes);
        assert_eq!(main, b"Manifest-Version: 1.0\r\nCreated-By: 17 (Eclipse Adoptium)\r\n\r\n");
    }

    #[test]
    fn main_attributes_bytes_is_whole_file_without_entry_sections() {
        let manifest_bytes = b"Manifest-Version: 1.0\r\n".to_vec();
        assert_eq!(main_attributes_bytes(&manifest_bytes), manifest_bytes.as_slice());
    }

    #[test]
    fn manifest_digest_algorithm_matches_main_attributes_suffix() {
        assert_eq!(
            manifest_digest_algorithm("SHA-256-Digest-Manifest-Main-Attributes", "-Digest-Manifest-Main-Attributes"),
            Some(DigestAlgorithm::Sha256)
        );
        assert_eq!(manifest_digest_algorithm("SHA-256-Digest-Manifest-Main-Attributes", "-Digest-Manifest"), None);
        assert_eq!(manifest_digest_algorithm("SHA-256-Digest-Manifest", "-Digest-Manifest"), Some(DigestAlgorithm::Sha256));
    }

    #[test]
    fn verify_against_manifest_checks_main_attributes_digest() {
        let manifest_bytes = sample_manifest_bytes();
        let manifest = Manifest::parse(&manifest_bytes).unwrap();
        let main_attrs_digest = crate::digest::compute(DigestAlgorithm::Sha256, main_attributes_bytes(&manifest_bytes));
        let whole_manifest_digest = crate::digest::compute(DigestAlgorithm::Sha256, &manifest_bytes);
        let entry_digest = crate::digest::compute(
            DigestAlgorithm::Sha256,
            &render_section_for_digest("com/acme/Widget.class", &manifest.entries["com/acme/Widget.class"]),
        );

        let sf_bytes = format!(
            "Signature-Version: 1.0\r\nSHA-256-Digest-Manifest-Main-Attributes: {main_attrs_digest}\r\nSHA-256-Digest-Manifest: {whole_manifest_digest}\r\n\r\nName: com/acme/Widget.class\r\nSHA-256-Digest: {entry_digest}\r\n\r\n"
        );
        let sf = SignatureFile::parse(sf_bytes.as_bytes()).unwrap();
        assert!(sf.verify_against_manifest(&manifest_bytes, &manifest).is_ok());
    }

    #[test]
    fn verify_against_manifest_rejects_tampered_main_attributes_digest() {
        let manifest_bytes = sample_manifest_bytes();
        let manifest = Manifest::parse(&manifest_bytes).unwrap();
        let entry_digest = crate::digest::compute(
            DigestAlgorithm::Sha256,
            &render_section_for_digest("com/acme/Widget.class", &manifest.entries["com/acme/Widget.class"]),
        );

        // Main-attributes digest is wrong, but every per-entry section still matches.
        let sf_bytes = format!(
            "Signature-Version: 1.0\r\nSHA-256-Digest-Manifest-Main-Attributes: not-the-real-digest\r\n\r\nName: com/acme/Widget.class\r\nSHA-256-Digest: {entry_digest}\r\n\r\n"
        );
        let sf = SignatureFile::parse(sf_bytes.as_bytes()).unwrap();
        assert_eq!(
            sf.verify_against_manifest(&manifest_bytes, &manifest),
            Err(ManifestError::SignatureInvalid { entry: "manifest main attributes".to_string() })
        );
    }
}
