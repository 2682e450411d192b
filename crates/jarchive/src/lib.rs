pub mod dist;
pub mod error;
pub mod jar;

pub use dist::{DistEntry, DistEntryKind, DistWalker};
pub use error::ArchiveError;
pub use jar::{JarEntryInfo, JarReader};
