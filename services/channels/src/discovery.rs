//! Recursive discovery of log export files.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Default file name suffix of AcquiSuite log exports.
pub const DEFAULT_SUFFIX: &str = ".log.csv";

/// All regular files under `root` whose name ends with `suffix`, sorted by path.
///
/// Unreadable directory entries are logged and skipped.
pub fn discover_files(root: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(suffix))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}
