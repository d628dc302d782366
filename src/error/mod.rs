//! Set of module Error
pub mod engine;
pub mod magnet;
pub mod selection;
pub mod storage;

use self::engine::EngineError;
use self::magnet::MagnetError;
use self::selection::SelectionError;
use self::storage::StorageError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The fatal error classes a download session can end with.
///
/// None of these are retried: every variant results in the engine handle
/// being released and the session returning an error to its caller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{0}")]
    /// The user input contained no valid file selection token.
    Selection(SelectionError),

    #[error("{0}")]
    /// The identifier is not a valid magnet link.
    Magnet(MagnetError),

    #[error("{0}")]
    /// The transfer engine failed, either while resolving metadata or
    /// after the downloads started.
    Engine(EngineError),

    #[error("{0}")]
    /// The destination directory could not be prepared.
    Storage(StorageError),

    #[error("{0}")]
    /// The interactive input or output stream broke.
    Io(std::io::Error),
}

impl From<SelectionError> for Error {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

impl From<MagnetError> for Error {
    fn from(value: MagnetError) -> Self {
        Self::Magnet(value)
    }
}

impl From<EngineError> for Error {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<StorageError> for Error {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
