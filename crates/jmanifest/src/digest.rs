//! Per-entry digest computation, for comparing against a manifest's
//! `*-Digest` headers or computing fresh ones when building a manifest.

use crate::error::ManifestError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest as Sha2Digest, Sha256, Sha512};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// The manifest header infix, e.g. `SHA-256` in `SHA-256-Digest`.
    pub fn header_name(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5-Digest",
            DigestAlgorithm::Sha1 => "SHA1-Digest",
            DigestAlgorithm::Sha256 => "SHA-256-Digest",
            DigestAlgorithm::Sha512 => "SHA-512-Digest",
        }
    }

    /// Header names are case-insensitive per the manifest grammar, so this
    /// matches regardless of how a particular tool cased the `*-Digest`
    /// header it wrote.
    pub fn from_header_name(name: &str) -> Option<DigestAlgorithm> {
        Some(match () {
            _ if name.eq_ignore_ascii_case("MD5-Digest") => DigestAlgorithm::Md5,
            _ if name.eq_ignore_ascii_case("SHA1-Digest") => DigestAlgorithm::Sha1,
            _ if name.eq_ignore_ascii_case("SHA-256-Digest") => DigestAlgorithm::Sha256,
            _ if name.eq_ignore_ascii_case("SHA-512-Digest") => DigestAlgorithm::Sha512,
            _ => return None,
        })
    }
}

pub fn compute(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    let bytes: Vec<u8> = match algorithm {
        DigestAlgorithm::Md5 => {
            use md5::Digest;
            Md5::digest(data).to_vec()
        }
        DigestAlgorithm::Sha1 => {
            use sha1::Digest;
            Sha1::digest(data).to_vec()
        }
        DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    };
    BASE64.encode(bytes)
}

/// Verifies `data` against a base64-encoded digest previously read from a
/// manifest or signature file header.
pub fn verify(algorithm: DigestAlgorithm, data: &[u8], expected_base64: &str) -> Result<bool, ManifestError> {
    Ok(compute(algorithm, data) == expected_base64.trim())
}

pub fn all_algorithms() -> [DigestAlgorithm; 4] {
    [DigestAlgorithm::Md5, DigestAlgorithm::Sha1, DigestAlgorithm::Sha256, DigestAlgorithm::Sha512]
}
