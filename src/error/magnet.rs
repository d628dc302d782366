pub type Result<T, E = MagnetError> = std::result::Result<T, E>;

/// Error type returned when validating a magnet identifier.
#[derive(Debug, thiserror::Error)]
pub enum MagnetError {
    #[error("invalid magnet link, it must start with \"magnet:\"")]
    /// The identifier is missing the required scheme prefix.
    InvalidIdentifier,

    #[error("{0}")]
    /// The identifier has the right scheme but is not a parseable URI.
    Parse(url::ParseError),
}

impl From<url::ParseError> for MagnetError {
    fn from(value: url::ParseError) -> Self {
        Self::Parse(value)
    }
}
