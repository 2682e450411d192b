use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] jclass::DecodeError),

    #[error(transparent)]
    Manifest(#[from] jmanifest::ManifestError),

    #[error("entry {0} is not present in this archive")]
    MissingEntry(String),
}
