//! Shared test fixtures: a scripted in-memory transfer engine and canned
//! bundle metadata.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::engine::{Priority, TransferEngine};
use crate::error::engine::{EngineError, Result};
use crate::magnet::Magnet;
use crate::metainfo::Metainfo;
use crate::piece_picker::PieceRange;
use crate::storage_info::FileInfo;
use crate::FileIndex;

/// A directive the core issued to the engine, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    DeselectPieces(PieceRange),
    SelectPieces(PieceRange, Priority),
    DeselectFile(FileIndex),
}

/// An engine double that records directives and serves scripted counters.
#[derive(Default)]
pub struct FakeEngine {
    metainfo: Option<Metainfo>,
    fetch_error: Option<EngineError>,
    directives: Mutex<Vec<Directive>>,
    started_dir: Mutex<Option<PathBuf>>,
    downloaded: Mutex<Vec<u64>>,
    rate: AtomicU64,
    peers: AtomicUsize,
    failure: Mutex<Option<EngineError>>,
    releases: AtomicUsize,
}

impl FakeEngine {
    pub fn with_metainfo(metainfo: Metainfo) -> Self {
        Self {
            metainfo: Some(metainfo),
            ..Self::default()
        }
    }

    pub fn with_fetch_error(mut self, error: EngineError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    /// Replaces the per-file downloaded byte counters.
    pub fn set_downloaded(&self, bytes: &[u64]) {
        *self.downloaded.lock().unwrap() = bytes.to_vec();
    }

    pub fn set_rate(&self, bps: u64) {
        self.rate.store(bps, Ordering::SeqCst);
    }

    pub fn set_failure(&self, error: EngineError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn directives(&self) -> Vec<Directive> {
        self.directives.lock().unwrap().clone()
    }

    pub fn started_dir(&self) -> Option<PathBuf> {
        self.started_dir.lock().unwrap().clone()
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    fn record(&self, directive: Directive) {
        self.directives.lock().unwrap().push(directive);
    }
}

#[async_trait]
impl TransferEngine for FakeEngine {
    async fn fetch_metainfo(&self, _magnet: &Magnet) -> Result<Metainfo> {
        if let Some(error) = &self.fetch_error {
            return Err(error.clone());
        }
        Ok(self
            .metainfo
            .clone()
            .expect("FakeEngine has no metainfo configured"))
    }

    async fn start(&self, _magnet: &Magnet, download_dir: &Path) -> Result<()> {
        *self.started_dir.lock().unwrap() = Some(download_dir.to_path_buf());
        Ok(())
    }

    fn deselect_pieces(&self, range: PieceRange) {
        self.record(Directive::DeselectPieces(range));
    }

    fn select_pieces(&self, range: PieceRange, priority: Priority) {
        self.record(Directive::SelectPieces(range, priority));
    }

    fn deselect_file(&self, index: FileIndex) {
        self.record(Directive::DeselectFile(index));
    }

    fn downloaded_bytes(&self, index: FileIndex) -> u64 {
        self.downloaded
            .lock()
            .unwrap()
            .get(index)
            .copied()
            .unwrap_or(0)
    }

    fn aggregate_rate_bps(&self) -> u64 {
        self.rate.load(Ordering::SeqCst)
    }

    fn peer_count(&self) -> usize {
        self.peers.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Option<EngineError> {
        self.failure.lock().unwrap().clone()
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builds a contiguous bundle of files with the given lengths.
pub fn metainfo_with_files(piece_len: u64, lens: &[u64]) -> Metainfo {
    let mut files = Vec::with_capacity(lens.len());
    let mut offset = 0;
    for (index, len) in lens.iter().enumerate() {
        files.push(FileInfo {
            path: format!("file-{}", index).into(),
            len: *len,
            torrent_offset: offset,
        });
        offset += len;
    }

    let total_len: u64 = lens.iter().sum();
    let piece_count = total_len.div_ceil(piece_len) as usize;

    Metainfo::new("test bundle".into(), piece_len, piece_count, total_len, files)
        .expect("fixture metainfo must be valid")
}
