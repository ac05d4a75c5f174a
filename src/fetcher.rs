//! Subtitle download and extraction
//!
//! Downloads the archive behind a selected candidate URL, picks the right
//! entry out of it and writes the subtitle next to the source file. Archives
//! are small, so the whole body is read into memory before being opened as a
//! ZIP container.

use crate::filename_parser;
use crate::movie_query::MovieQuery;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Production download base of the subtitle provider.
const DOWNLOAD_BASE_URL: &str = "https://dl.subdl.com";

/// Extension of the subtitle files we extract.
const SUBTITLE_EXTENSION: &str = "srt";

/// Errors that can occur while fetching a subtitle archive.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request to the download endpoint failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Download endpoint answered with a non-success status
    #[error("Failed to download the subtitle: HTTP {0}")]
    DownloadFailed(u16),

    /// Response body is not a readable ZIP archive
    #[error("Failed to read subtitle archive: {0}")]
    InvalidArchive(String),

    /// No entry in the archive is usable for this query
    #[error("Archive contains no usable subtitle entry")]
    NoUsableEntry,

    /// Failed to write the extracted subtitle to disk
    #[error("Failed to write subtitle file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Downloads and extracts subtitle archives.
pub struct SubtitleFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl Default for SubtitleFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SubtitleFetcher {
    /// Creates a fetcher against the production download base.
    pub fn new() -> Self {
        Self::with_base_url(DOWNLOAD_BASE_URL)
    }

    /// Creates a fetcher against a custom download base (used by tests).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Downloads the archive at `relative_url` and writes the matching entry
    /// next to the query's source file, swapping the extension to `.srt`.
    ///
    /// An existing subtitle at the destination path is overwritten.
    pub async fn fetch(
        &self,
        query: &MovieQuery,
        relative_url: &str,
        directory: &Path,
    ) -> Result<PathBuf, FetchError> {
        let url = format!("{}{}", self.base_url, relative_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::DownloadFailed(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::RequestError(e.to_string()))?;

        let mut archive = zip::ZipArchive::new(Cursor::new(body))
            .map_err(|e| FetchError::InvalidArchive(e.to_string()))?;

        let destination =
            directory.join(Path::new(&query.filename).with_extension(SUBTITLE_EXTENSION));

        let mut matched: Option<(String, Vec<u8>)> = None;
        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(archive = %url, index, error = %e, "skipping unreadable archive entry");
                    continue;
                }
            };

            let entry_name = entry.name().to_string();
            if !usable_entry(&entry_name, query) {
                continue;
            }

            let mut contents = Vec::with_capacity(entry.size() as usize);
            if let Err(e) = entry.read_to_end(&mut contents) {
                warn!(entry = %entry_name, error = %e, "skipping unreadable archive entry");
                continue;
            }

            matched = Some((entry_name, contents));
            break;
        }

        let (entry_name, contents) = match matched {
            Some(matched) => matched,
            None => return Err(FetchError::NoUsableEntry),
        };

        tokio::fs::write(&destination, &contents)
            .await
            .map_err(|e| FetchError::WriteFailed {
                path: destination.clone(),
                source: e,
            })?;

        debug!(entry = %entry_name, destination = %destination.display(), "subtitle written");
        Ok(destination)
    }
}

/// Checks whether an archive entry may satisfy the query.
///
/// Non-subtitle entries are skipped. For episodic queries the entry name is
/// re-parsed and a present-but-different episode number disqualifies it; this
/// guards against full-season archives bundling many episodes.
fn usable_entry(entry_name: &str, query: &MovieQuery) -> bool {
    let file_name = match Path::new(entry_name).file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };

    let is_subtitle = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SUBTITLE_EXTENSION));
    if !is_subtitle {
        return false;
    }

    if let Some(series) = query.series {
        if let Some(parsed) = filename_parser::parse(file_name) {
            if let Some(episode) = parsed.episode {
                return episode == series.episode;
            }
        }
    }

    true
}
