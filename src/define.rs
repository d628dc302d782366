use bitvec::prelude::{BitVec, Msb0};

/// The index of a piece within the bundle, in `[0, piece_count)`.
pub type PieceIndex = usize;

/// The index of a file within the bundle's file list.
pub type FileIndex = usize;

/// The set of pieces covered by the current selection.
///
/// The bit at a piece's index is set if the piece intersects the byte span
/// of at least one selected file.
pub type Bitfield = BitVec<u8, Msb0>;
