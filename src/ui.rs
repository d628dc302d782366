//! Rendering helpers for the interactive session.
//!
//! The display is advisory only: everything in here builds strings, the
//! session decides where they go. A non-interactive embedder can skip
//! this module entirely and log the raw samples instead.

use std::time::Duration;

use crate::metainfo::Metainfo;
use crate::progress::ProgressSample;

/// Length of the progress bar in terminal cells.
const BAR_LEN: usize = 50;

const RESET: &str = "\x1b[0m";
const GREEN_BG: &str = "\x1b[42m";
const GRAY_BG: &str = "\x1b[100m";
const GRAY: &str = "\x1b[90m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const MAGENTA: &str = "\x1b[35m";
const BLUE: &str = "\x1b[34m";

/// Formats a byte count with a fitting unit.
pub fn human_bytes(value: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = value as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Formats a transfer rate with a fitting unit.
pub fn human_rate(bps: f64) -> String {
    const UNITS: [&str; 5] = ["B/s", "KB/s", "MB/s", "GB/s", "TB/s"];
    let mut value = bps.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Formats an ETA as minutes and seconds, or `Unknown` when there is no
/// usable estimate.
pub fn format_eta(eta: Option<Duration>) -> String {
    match eta {
        Some(eta) => {
            let total = eta.as_secs();
            format!("{}m {}s", total / 60, total % 60)
        }
        None => "Unknown".to_string(),
    }
}

/// Renders the metadata summary and the numbered file listing shown
/// before the selection prompt. File numbers are 1-based, matching the
/// selection grammar.
pub fn render_listing(metainfo: &Metainfo) -> String {
    let mut out = String::new();

    out.push_str("\nTorrent metadata loaded.\n");
    out.push_str(&format!("Name: {}\n", metainfo.name));
    out.push_str(&format!("Files: {}\n", metainfo.file_count()));
    out.push_str(&format!(
        "Total size: {}\n",
        human_bytes(metainfo.total_len)
    ));
    out.push_str(&format!(
        "Piece length: {}\n",
        human_bytes(metainfo.piece_len)
    ));

    out.push_str("\nFiles:\n");
    for (index, file) in metainfo.files.iter().enumerate() {
        out.push_str(&format!(
            "{}: {} ({})\n",
            index + 1,
            file.path.display(),
            human_bytes(file.len)
        ));
    }

    out
}

/// Renders one animated status frame.
///
/// The frame starts with a carriage return and rewrites the current
/// terminal line, which is what gives the bar its animation on an
/// interactive terminal.
pub fn render_frame(sample: &ProgressSample) -> String {
    let percent = sample.percent();
    let filled = (percent / 100.0 * BAR_LEN as f64).round() as usize;
    let filled = filled.min(BAR_LEN);

    let bar = format!(
        "{}{}{}{}{}{}",
        GREEN_BG,
        " ".repeat(filled),
        RESET,
        GRAY_BG,
        " ".repeat(BAR_LEN - filled),
        RESET
    );

    format!(
        "\r{GRAY}[{RESET}{bar}{GRAY}]{RESET} \
        {CYAN}{percent:.2}%{RESET} | \
        {YELLOW}Downloaded: {downloaded}{RESET} | \
        {GREEN}Speed: {rate}{RESET} | \
        {MAGENTA}ETA: {eta}{RESET} | \
        {BLUE}Peers: {peers}{RESET}",
        downloaded = human_bytes(sample.selected_downloaded),
        rate = human_rate(sample.engine_rate_bps as f64),
        eta = format_eta(sample.eta),
        peers = sample.peer_count,
    )
}
