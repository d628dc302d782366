use std::collections::BTreeSet;

use crate::error::selection::{Result, SelectionError};
use crate::FileIndex;

/// The validated set of selected file indices, 0-based.
///
/// Created once per session and never mutated after the piece-range
/// mapper consumed it. The ordered set keeps listing and byte-summing
/// deterministic.
pub type SelectionSet = BTreeSet<FileIndex>;

/// Parses a free-form file selection into a set of 0-based file indices.
///
/// The grammar accepts `"all"` (case-insensitive, surrounding whitespace
/// ignored) or a comma separated list of tokens, each a single 1-based
/// number or a dash separated inclusive range `a-b`.
///
/// A token is kept iff it parses, its bounds are ordered and both lie in
/// `[1, total_files]`. Anything else is dropped with a warning instead of
/// failing the whole input, so `"abc,3"` still selects file 3. Only an
/// input from which no token survives is an error.
pub fn parse_selection(input: &str, total_files: usize) -> Result<SelectionSet> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Ok((0..total_files).collect());
    }

    let mut selected = SelectionSet::new();

    for token in input.split(',') {
        let token = token.trim();
        match parse_token(token, total_files) {
            Some((start, end)) => {
                // convert from the 1-based listing to 0-based indices.
                selected.extend(start - 1..end);
            }
            None => {
                log::warn!("Dropping invalid selection token {:?}", token);
            }
        }
    }

    if selected.is_empty() {
        return Err(SelectionError::InvalidSelection);
    }

    Ok(selected)
}

/// Parses one token into its inclusive 1-based `(start, end)` bounds, or
/// `None` if the token is malformed or out of bounds.
fn parse_token(token: &str, total_files: usize) -> Option<(usize, usize)> {
    let (start, end) = match token.split_once('-') {
        Some((a, b)) => (a.trim().parse().ok()?, b.trim().parse().ok()?),
        None => {
            let single: usize = token.parse().ok()?;
            (single, single)
        }
    };

    if start >= 1 && start <= end && end <= total_files {
        Some((start, end))
    } else {
        None
    }
}
