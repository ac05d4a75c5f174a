//! Directory scanning for media files
//!
//! This module lists the entries of a single directory and keeps the regular
//! files whose extension is on the fixed media allow-list. Scanning is not
//! recursive: subtitles are always written next to their source file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while scanning for media files
#[derive(Debug, Error)]
pub enum ScanError {
    /// Path is not a directory
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Failed to read directory
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to read directory entry
    #[error("Failed to read directory entry: {0}")]
    ReadEntryFailed(#[from] io::Error),
}

/// Known media container extensions, grouped by the source they typically
/// carry. Matching is case-insensitive.
const MEDIA_EXTENSIONS: &[&str] = &[
    // Unknown
    "webm",
    // SDTV
    "m4v", "3gp", "nsv", "ty", "strm", "rm", "rmvb", "m3u", "ifo", "mov", "qt", "divx", "xvid",
    "bivx", "nrg", "pva", "wmv", "asf", "asx", "ogm", "ogv", "m2v", "avi", "bin", "dat", "dvr-ms",
    "mpg", "mpeg", "mp4", "avc", "vp3", "svq3", "nuv", "viv", "dv", "fli", "flv", "wpl",
    // DVD
    "img", "iso", "vob",
    // HD
    "mkv", "mk3d", "ts", "wtv",
    // Bluray
    "m2ts",
];

/// Scans a directory (non-recursively) for media files.
///
/// Returns the bare filenames, sorted for a deterministic processing order.
pub fn scan_for_media(directory: &Path) -> Result<Vec<String>, ScanError> {
    if !directory.is_dir() {
        return Err(ScanError::NotADirectory(directory.to_path_buf()));
    }

    let mut filenames = Vec::new();

    for entry in fs::read_dir(directory).map_err(|e| ScanError::ReadDirectoryFailed {
        path: directory.to_path_buf(),
        source: e,
    })? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && has_media_extension(&path) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                filenames.push(name.to_string());
            }
        }
    }

    filenames.sort();
    Ok(filenames)
}

/// Checks whether a path carries one of the known media extensions.
fn has_media_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}
