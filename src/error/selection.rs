pub type Result<T, E = SelectionError> = std::result::Result<T, E>;

/// Error type returned when parsing a file selection string.
///
/// Malformed or out-of-bounds tokens are dropped rather than reported,
/// so the only failure is an input from which nothing usable remains.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no valid files selected")]
    /// Every token in the input was malformed or out of bounds.
    InvalidSelection,
}
