use std::fmt;

use crate::error::engine::MetainfoError;
use crate::selection::SelectionSet;
use crate::storage_info::FileInfo;

pub(crate) type Result<T> = std::result::Result<T, MetainfoError>;

/// The static metadata of a bundle, as reported by the transfer engine
/// once its metadata-ready signal fired.
///
/// Read-only after construction; the session shares it between the
/// piece-range mapper and the progress estimator without locking.
#[derive(Clone)]
pub struct Metainfo {
    /// The bundle name, the stem for the download directory.
    pub name: String,
    /// The fixed length of a piece in bytes. Only the last piece of the
    /// bundle may be shorter.
    pub piece_len: u64,
    /// The number of pieces in the bundle.
    pub piece_count: usize,
    /// The length of the whole bundle in bytes.
    pub total_len: u64,
    /// The bundle's files, ordered by their byte offset.
    pub files: Vec<FileInfo>,
}

impl fmt::Debug for Metainfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metainfo")
            .field("name", &self.name)
            .field("piece_len", &self.piece_len)
            .field("piece_count", &self.piece_count)
            .field("total_len", &self.total_len)
            .field("files", &self.files.len())
            .finish()
    }
}

impl Metainfo {
    /// Builds a [`Metainfo`] from engine-reported values, verifying the
    /// bundle invariants.
    ///
    /// Here are the rules:
    /// - the piece length, piece count and total length must be positive.
    /// - there must be at least one file.
    /// - file offsets must be contiguous and monotonically increasing:
    ///   each file starts where the previous one ended, and together they
    ///   cover the total length.
    /// - the piece count must be exactly `ceil(total_len / piece_len)`.
    ///
    /// A file of length zero is legal, it occupies no byte span.
    pub fn new(
        name: String,
        piece_len: u64,
        piece_count: usize,
        total_len: u64,
        files: Vec<FileInfo>,
    ) -> Result<Self> {
        if piece_len == 0 {
            log::warn!("Piece length is 0");
            return Err(MetainfoError::InvalidPieceLength);
        }
        if total_len == 0 {
            log::warn!("Bundle length is 0");
            return Err(MetainfoError::EmptyBundle);
        }
        if files.is_empty() {
            log::warn!("Bundle file list is empty");
            return Err(MetainfoError::NoFiles);
        }

        // verify the files form one contiguous byte array
        let mut offset = 0;
        for file in files.iter() {
            if file.torrent_offset != offset {
                log::warn!(
                    "File {:?} starts at {} instead of {}",
                    file.path,
                    file.torrent_offset,
                    offset
                );
                return Err(MetainfoError::NonContiguousFiles);
            }
            offset += file.len;
        }
        if offset != total_len {
            log::warn!("Files cover {} bytes of a {} byte bundle", offset, total_len);
            return Err(MetainfoError::NonContiguousFiles);
        }

        let expected_pieces = total_len.div_ceil(piece_len) as usize;
        if piece_count != expected_pieces {
            log::warn!(
                "Bundle of {} bytes needs {} pieces of {} bytes, engine reported {}",
                total_len,
                expected_pieces,
                piece_len,
                piece_count
            );
            return Err(MetainfoError::InvalidPieceCount);
        }

        Ok(Metainfo {
            name,
            piece_len,
            piece_count,
            total_len,
            files,
        })
    }

    /// The number of files in the bundle.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Return true if the bundle carries multiple files.
    pub fn is_archive(&self) -> bool {
        self.files.len() > 1
    }

    /// Sums the nominal byte length of exactly the selected files.
    ///
    /// This is the completion target of the session: the bundle is done
    /// once the engine has downloaded this many bytes for the selection,
    /// regardless of what the rest of the bundle looks like.
    pub fn selection_len(&self, selection: &SelectionSet) -> u64 {
        selection
            .iter()
            .filter_map(|index| self.files.get(*index))
            .map(|file| file.len)
            .sum()
    }
}
