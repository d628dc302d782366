use std::fmt;

use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::error::magnet::{MagnetError, Result};

/// Contains the characters that need to be URL encoded according to:
/// https://en.wikipedia.org/wiki/Percent-encoding#Types_of_URI_characters
const URL_ENCODE_RESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'~')
    .remove(b'.');

/// Curated list of reliable public UDP trackers, appended to every magnet
/// link for better peer discovery.
static PUBLIC_TRACKERS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "udp://tracker.opentrackr.org:1337/announce",
        "udp://open.tracker.cl:1337/announce",
        "udp://tracker.torrent.eu.org:451/announce",
        "udp://tracker.tiny-vps.com:6969/announce",
        "udp://open.stealth.si:80/announce",
        "udp://exodus.desync.com:6969/announce",
        "udp://tracker.cyberia.is:6969/announce",
        "udp://www.torrent.eu.org:451/announce",
        "udp://tracker1.bt.moack.co.kr:80/announce",
        "udp://tracker.openbittorrent.com:6969/announce",
        "udp://bt.xxx-tracker.com:2710/announce",
        "udp://explodie.org:6969/announce",
        "udp://p4p.arenabg.com:1337/announce",
        "udp://opentracker.i2p.rocks:6969/announce",
        "udp://tracker.internetwarriors.net:1337/announce",
        "udp://tracker.openbittorrent.com:80/announce",
        "udp://ipv4.tracker.harry.lu:80/announce",
        "udp://open.demonii.si:1337/announce",
    ]
});

/// A validated magnet identifier for a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magnet {
    uri: String,
}

impl Magnet {
    /// Validates the given identifier as a magnet link.
    ///
    /// The input is trimmed first. The identifier must carry the `magnet:`
    /// scheme prefix and parse as a URI, anything else is rejected without
    /// retry.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if !input.starts_with("magnet:") {
            return Err(MagnetError::InvalidIdentifier);
        }

        // make sure the rest of the identifier is sane before handing it
        // to the engine.
        Url::parse(input)?;

        Ok(Magnet { uri: input.to_string() })
    }

    /// Returns a copy of this magnet link with the public tracker list
    /// appended as percent-encoded `tr` parameters.
    ///
    /// Trackers already present in the link are left alone; the engine
    /// deduplicates announce urls itself.
    pub fn with_public_trackers(&self) -> Self {
        let mut uri = self.uri.clone();
        for tracker in PUBLIC_TRACKERS.iter() {
            let encoded =
                percent_encoding::utf8_percent_encode(tracker, URL_ENCODE_RESERVED);
            uri.push_str("&tr=");
            uri.push_str(&encoded.to_string());
        }

        log::debug!("appended {} public trackers to magnet link", PUBLIC_TRACKERS.len());

        Magnet { uri }
    }

    /// The identifier as handed to the transfer engine.
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for Magnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}
