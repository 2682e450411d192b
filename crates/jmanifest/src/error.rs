use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest line {line} is not a header, a continuation, or blank: {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("manifest line {line} continues a line but no header precedes it")]
    DanglingContinuation { line: usize },

    #[error("header name on line {line} is empty")]
    EmptyHeaderName { line: usize },

    #[error("digest algorithm {algorithm} is not supported")]
    UnsupportedDigestAlgorithm { algorithm: String },

    #[error("signature verification requires a crypto backend, but none is compiled in")]
    CryptoDisabled,

    #[error("signature block for {entry} failed verification")]
    SignatureInvalid { entry: String },

    #[error("signature file references digest of section {section:?} which is missing from the manifest")]
    MissingSection { section: String },

    #[error("entry {entry} does not match its declared {algorithm} in the manifest")]
    DigestMismatch { entry: String, algorithm: String },
}
