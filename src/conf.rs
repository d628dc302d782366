use std::path::PathBuf;
use std::time::Duration;

use directories::UserDirs;

/// The default number of peer connections the engine is allowed to open.
pub const DEFAULT_MAX_CONNECTIONS: usize = 200;

/// The default wall-clock interval between two progress samples.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// The default number of rate samples kept for smoothing.
pub const DEFAULT_RATE_WINDOW: usize = 10;

/// Configuration for a download session.
#[derive(Debug, Clone)]
pub struct Conf {
    /// The base directory under which each bundle gets its own folder.
    pub download_dir: PathBuf,
    /// The maximum number of connections the engine may open.
    pub max_connections: usize,
    /// The interval at which the progress estimator samples the engine.
    pub update_interval: Duration,
    /// How many instantaneous rate samples the smoothing window holds.
    pub rate_window: usize,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }
}

/// Returns `~/Downloads/Torrents`, or a relative `Downloads/Torrents` when
/// the platform cannot tell us where the user's home is.
fn default_download_dir() -> PathBuf {
    let base = UserDirs::new()
        .map(|dirs| {
            dirs.download_dir()
                .map(|d| d.to_path_buf())
                .unwrap_or_else(|| dirs.home_dir().join("Downloads"))
        })
        .unwrap_or_else(|| PathBuf::from("Downloads"));
    base.join("Torrents")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_conf_matches_reference_values() {
        let conf = Conf::default();
        assert_eq!(conf.max_connections, 200);
        assert_eq!(conf.update_interval, Duration::from_secs(1));
        assert_eq!(conf.rate_window, 10);
        assert!(conf.download_dir.ends_with("Torrents"));
    }
}
