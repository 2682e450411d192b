pub mod digest;
pub mod emit;
pub mod error;
pub mod parse;
pub mod sign;

pub use digest::{compute as compute_digest, verify as verify_digest, DigestAlgorithm};
pub use emit::emit;
pub use error::ManifestError;
pub use parse::{Manifest, Section};
pub use sign::{CryptoBackend, NoCryptoBackend, SignatureFile};

#[cfg(feature = "crypto")]
pub use sign::OpensslBackend;
