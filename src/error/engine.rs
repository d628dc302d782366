pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Error type surfaced by the transfer engine.
///
/// The engine is an external collaborator; its failures reach the core
/// either from the awaited metadata acquisition or from the polled
/// runtime failure accessor. Both are fatal to the session.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("engine failed to resolve metadata: {0}")]
    /// The engine failed while resolving the bundle metadata.
    Metadata(String),

    #[error("timed out waiting for bundle metadata")]
    /// The engine never produced metadata within its deadline.
    MetadataTimeout,

    #[error("transfer failed: {0}")]
    /// A runtime failure after the downloads started.
    Transfer(String),

    #[error("invalid metainfo: {0}")]
    /// The engine reported metadata that violates the bundle invariants.
    InvalidMetainfo(MetainfoError),
}

impl From<MetainfoError> for EngineError {
    fn from(value: MetainfoError) -> Self {
        Self::InvalidMetainfo(value)
    }
}

/// Error type returned when validating engine-reported metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetainfoError {
    #[error("piece length must be positive")]
    InvalidPieceLength,
    #[error("piece count does not cover the bundle length")]
    InvalidPieceCount,
    #[error("bundle must contain at least one byte")]
    EmptyBundle,
    #[error("bundle must contain at least one file")]
    NoFiles,
    #[error("file offsets are not contiguous")]
    NonContiguousFiles,
}
