use std::fmt;

use crate::engine::{Priority, TransferEngine};
use crate::metainfo::Metainfo;
use crate::selection::SelectionSet;
use crate::storage_info::FileInfo;
use crate::{Bitfield, PieceIndex};

/// An inclusive range of piece indices.
///
/// Ranges are always derived from file byte spans, never authored
/// directly by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceRange {
    /// The first piece of the range.
    pub start: PieceIndex,
    /// The last piece of the range, `end >= start`.
    pub end: PieceIndex,
}

impl PieceRange {
    pub fn new(start: PieceIndex, end: PieceIndex) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// The number of pieces the range covers.
    pub fn piece_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: PieceIndex) -> bool {
        self.start <= index && index <= self.end
    }
}

impl fmt::Display for PieceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}]", self.start, self.end)
    }
}

/// Returns the pieces that intersect the file's byte span.
///
/// The first and last piece may be shared with neighbouring files, the
/// range still covers the partial overlap at both boundaries. A file of
/// length zero intersects no piece and yields `None`.
pub fn piece_range_of(file: &FileInfo, piece_len: u64) -> Option<PieceRange> {
    if file.is_empty() {
        return None;
    }

    let start = (file.torrent_offset / piece_len) as PieceIndex;
    let end = (file.end_offset().div_ceil(piece_len) - 1) as PieceIndex;

    Some(PieceRange::new(start, end))
}

/// Computes the minimal disjoint set of piece ranges covering exactly the
/// selected files.
///
/// One range is collected per selected non-empty file; overlapping and
/// exactly adjacent ranges are then merged. The result is sorted, pairwise
/// disjoint and covers precisely the pieces the selection needs. The
/// function is pure, applying it twice to the same input yields the same
/// output.
pub fn compute_ranges(
    files: &[FileInfo],
    selection: &SelectionSet,
    piece_len: u64,
) -> Vec<PieceRange> {
    let ranges = selection
        .iter()
        .filter_map(|index| files.get(*index))
        .filter_map(|file| piece_range_of(file, piece_len))
        .collect();

    merge_ranges(ranges)
}

/// Merges overlapping and exactly adjacent ranges into a minimal set.
///
/// Adjacent ranges (zero piece gap) merge too: adjacent pieces gain
/// nothing from separate priority directives, so fewer directives reach
/// the engine. Output ranges are separated by a gap of at least two.
pub fn merge_ranges(mut ranges: Vec<PieceRange>) -> Vec<PieceRange> {
    if ranges.is_empty() {
        return ranges;
    }

    ranges.sort_unstable_by_key(|range| range.start);

    let mut merged: Vec<PieceRange> = Vec::with_capacity(ranges.len());
    for next in ranges {
        if let Some(current) = merged.last_mut() {
            // `current.end + 1 >= next.start` covers both overlap and
            // zero-gap adjacency. Written without subtraction so a range
            // starting at piece 0 cannot underflow.
            if current.end + 1 >= next.start {
                current.end = current.end.max(next.end);
                continue;
            }
        }
        merged.push(next);
    }

    merged
}

/// Expands the ranges into the per-piece bitfield of wanted pieces.
pub fn wanted_pieces(ranges: &[PieceRange], piece_count: usize) -> Bitfield {
    let mut pieces = Bitfield::repeat(false, piece_count);
    for range in ranges {
        for index in range.start..=range.end {
            pieces.set(index, true);
        }
    }
    pieces
}

/// Applies the selection to the transfer engine and returns the merged
/// ranges that were activated.
///
/// The engine's default is to download the whole bundle, so the entire
/// piece space is deprioritized first, then each merged range is selected
/// at normal priority. Finally every non-selected file gets an explicit
/// file-level deselect: piece-range and file-level deselection are two
/// independent mechanisms in the engine, and when piece and file
/// boundaries don't align, skipping either one can leave unwanted data in
/// flight.
///
/// All directives must have been issued before the progress estimator is
/// armed.
pub fn apply_selection<E>(
    engine: &E,
    metainfo: &Metainfo,
    selection: &SelectionSet,
) -> Vec<PieceRange>
where
    E: TransferEngine + ?Sized,
{
    let ranges = compute_ranges(&metainfo.files, selection, metainfo.piece_len);

    engine.deselect_pieces(PieceRange::new(0, metainfo.piece_count - 1));

    for range in ranges.iter() {
        engine.select_pieces(*range, Priority::Normal);
        log::info!("Selected piece range {}", range);
    }

    for (index, file) in metainfo.files.iter().enumerate() {
        if !selection.contains(&index) {
            engine.deselect_file(index);
            log::info!("Deselected file: {}", file.path.display());
        }
    }

    let wanted = wanted_pieces(&ranges, metainfo.piece_count);
    log::info!(
        "Selection wants {} of {} pieces across {} ranges",
        wanted.count_ones(),
        metainfo.piece_count,
        ranges.len()
    );

    ranges
}
