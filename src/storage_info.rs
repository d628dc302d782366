use std::path::{Path, PathBuf};

use crate::error::storage::{Result, StorageError};

/// Information about a single file in the bundle.
///
/// The file's index is its position in [`crate::metainfo::Metainfo::files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// file's relative path from the download directory.
    pub path: PathBuf,
    /// the file's length
    pub len: u64,
    /// The byte offset of the file within the bundle, when all files in
    /// the bundle are viewed as a single contiguous byte array. This is
    /// always 0 for a single file bundle.
    pub torrent_offset: u64,
}

impl FileInfo {
    /// The first byte offset past the end of this file.
    pub fn end_offset(&self) -> u64 {
        self.torrent_offset + self.len
    }

    /// Return true if the file occupies no byte span at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Reduces a bundle name to a filesystem friendly directory name.
///
/// Every byte outside `[a-zA-Z0-9]` becomes an underscore, so engine
/// reported names cannot escape the download directory or collide with
/// shell syntax.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Creates the per-bundle destination directory under `base`.
///
/// Intermediate directories are created as needed. Failure here is fatal
/// to the session, there is nowhere to write pieces to.
pub async fn prepare_download_dir(base: &Path, bundle_name: &str) -> Result<PathBuf> {
    let dir = base.join(sanitize_name(bundle_name));

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| StorageError::Directory {
            path: dir.clone(),
            source,
        })?;

    log::info!("Created/using download folder: {}", dir.display());

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn file_info_byte_span() {
        let file = FileInfo {
            path: "a/b".into(),
            len: 2048,
            torrent_offset: 1000,
        };
        assert_eq!(file.end_offset(), 3048);
        assert!(!file.is_empty());

        let empty = FileInfo {
            path: "c".into(),
            len: 0,
            torrent_offset: 3048,
        };
        assert_eq!(empty.end_offset(), 3048);
        assert!(empty.is_empty());
    }

    #[test]
    fn sanitize_name_replaces_special_bytes() {
        assert_eq!(
            sanitize_name("Some Show S01 [1080p] (x265)"),
            "Some_Show_S01__1080p___x265_"
        );
        assert_eq!(sanitize_name("../../etc/passwd"), "________etc_passwd");
        assert_eq!(sanitize_name("plain"), "plain");
    }

    #[tokio::test]
    async fn prepare_download_dir_creates_nested_folder() {
        let base = tempfile::tempdir().unwrap();

        let dir = prepare_download_dir(base.path(), "My Bundle!")
            .await
            .unwrap();

        assert_eq!(dir, base.path().join("My_Bundle_"));
        assert!(dir.is_dir());

        // calling again on an existing folder is fine.
        let again = prepare_download_dir(base.path(), "My Bundle!")
            .await
            .unwrap();
        assert_eq!(again, dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn prepare_download_dir_reports_unwritable_base() {
        // a regular file cannot act as the base directory.
        let base = tempfile::tempdir().unwrap();
        let blocked = base.path().join("blocked");
        tokio::fs::write(&blocked, b"x").await.unwrap();

        let result = prepare_download_dir(&blocked, "bundle").await;
        assert!(matches!(result, Err(StorageError::Directory { .. })));
    }
}
