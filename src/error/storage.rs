use std::path::PathBuf;

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

/// Error type returned when preparing the destination directory.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("cannot create download directory {path:?}: {source}")]
    /// The destination path could not be created.
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
}
