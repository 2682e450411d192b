//! Umbrella crate re-exporting the class-file decoder, semantic differ,
//! JAR manifest engine, archive/distribution walker, and dependency
//! extractor as one dependency. The `jvm-tools` binary in this workspace
//! depends on the individual crates directly; this crate exists for
//! embedders who want the whole stack behind one `Cargo.toml` line.

pub use jarchive;
pub use jclass;
pub use jdep;
pub use jdiff;
pub use jmanifest;
