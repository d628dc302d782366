//! The abstract transfer engine the selective-download core drives.
//!
//! Everything peer-to-peer lives behind this trait: discovery, the wire
//! protocol, piece verification and disk io are the engine's business.
//! The core only reads its counters and steers it with fire-and-forget
//! priority directives.

use std::path::Path;

use async_trait::async_trait;

use crate::error::engine::{EngineError, Result};
use crate::magnet::Magnet;
use crate::metainfo::Metainfo;
use crate::piece_picker::PieceRange;
use crate::FileIndex;

/// The priority band at which a piece range is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Requested in the engine's regular rotation.
    Normal,
    /// Requested ahead of normal ranges.
    High,
}

/// The engine downloading the bundle on our behalf.
///
/// The original engine interface is event driven; this trait re-expresses
/// it with explicit outcomes instead of registered handlers. Metadata
/// acquisition is a single awaited call and runtime failures are polled
/// through [`TransferEngine::failure`], so no listener can fire twice or
/// leak past the session.
#[async_trait]
pub trait TransferEngine: Send + Sync {
    /// Resolves the metadata of the bundle behind the magnet link.
    ///
    /// Suspends until the engine's metadata-ready signal fires. Fails
    /// with [`EngineError::MetadataTimeout`] if the engine gives up
    /// waiting, or [`EngineError::Metadata`] on any other resolution
    /// failure.
    async fn fetch_metainfo(&self, magnet: &Magnet) -> Result<Metainfo>;

    /// Starts transferring the bundle into the given directory.
    ///
    /// Once this returns the engine is downloading the *whole* bundle;
    /// the caller must immediately deprioritize the full piece space and
    /// re-select the ranges it wants.
    async fn start(&self, magnet: &Magnet, download_dir: &Path) -> Result<()>;

    /// Drops the pieces in `range` from the engine's request rotation.
    ///
    /// Fire-and-forget: the engine applies it eventually, but before any
    /// subsequently issued directive.
    fn deselect_pieces(&self, range: PieceRange);

    /// Requests the pieces in `range` at the given priority.
    fn select_pieces(&self, range: PieceRange, priority: Priority);

    /// Excludes a whole file from the transfer, independently of any
    /// piece-level directive.
    fn deselect_file(&self, index: FileIndex);

    /// The number of bytes the engine has downloaded for the file so far.
    ///
    /// The engine's last-chunk accounting may transiently overshoot the
    /// file's nominal length by up to one piece.
    fn downloaded_bytes(&self, index: FileIndex) -> u64;

    /// The engine's own download rate over the whole bundle, in bytes per
    /// second. Advisory only, the estimator derives its selection-scoped
    /// rate independently.
    fn aggregate_rate_bps(&self) -> u64;

    /// The number of peers the engine is currently connected to.
    fn peer_count(&self) -> usize;

    /// Returns the runtime failure the engine ran into, if any.
    ///
    /// Polled by the progress estimator on every tick; a `Some` stops the
    /// session.
    fn failure(&self) -> Option<EngineError>;

    /// Terminates all engine resources. Idempotent.
    fn release(&self);
}
