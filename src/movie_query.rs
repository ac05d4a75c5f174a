//! Per-file query model
//!
//! A [`MovieQuery`] captures everything the pipeline knows about one media
//! file. It is built once from the filename, then owned exclusively by the
//! task that processes it.

use crate::catalog::{FilmIdentifier, SearchRequest};
use crate::filename_parser;
use tracing::warn;

/// Season/episode context. Presence switches the pipeline into episodic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesInfo {
    /// Season number, strictly positive
    pub season: u32,
    /// Episode number, strictly positive
    pub episode: u32,
}

impl SeriesInfo {
    /// Builds series info from parsed season/episode values.
    ///
    /// A zero or absent value on either side marks the file as a standalone
    /// movie, so `None` is returned.
    fn from_parsed(season: Option<u32>, episode: Option<u32>) -> Option<Self> {
        match (season, episode) {
            (Some(season), Some(episode)) if season > 0 && episode > 0 => {
                Some(Self { season, episode })
            }
            _ => None,
        }
    }
}

/// One media file's state through the subtitle pipeline.
#[derive(Debug, Clone)]
pub struct MovieQuery {
    /// The original filename on disk
    pub filename: String,
    /// Parsed title, used for exact-match disambiguation
    pub title: String,
    /// Release year, when the filename carried one
    pub year: Option<u16>,
    /// Season/episode context for episodic content
    pub series: Option<SeriesInfo>,
    /// Quality/source tag (may be empty)
    pub quality: String,
    /// Codec tag, normalized (may be empty)
    pub codec: String,
    /// Preferred subtitle language code
    pub language: String,
}

impl MovieQuery {
    /// Builds a query from a filename, or `None` when the name is unparsable.
    pub fn from_filename(filename: &str, language: &str) -> Option<Self> {
        let parsed = filename_parser::parse(filename)?;

        Some(Self {
            filename: filename.to_string(),
            title: parsed.title,
            year: parsed.year,
            series: SeriesInfo::from_parsed(parsed.season, parsed.episode),
            quality: parsed.quality.unwrap_or_default(),
            codec: parsed.codec.unwrap_or_default(),
            language: language.to_string(),
        })
    }

    /// Builds a catalog search request keyed by the given identifier.
    pub(crate) fn search_request(&self, identifier: FilmIdentifier) -> SearchRequest {
        SearchRequest {
            identifier,
            language: self.language.clone(),
            series: self.series,
            year: self.year,
        }
    }
}

/// Builds queries for all scanned filenames.
///
/// Unparsable filenames are skipped with a warning; they do not take part in
/// the pipeline and are not counted in the success/failure totals.
pub fn build_queries(filenames: &[String], language: &str) -> Vec<MovieQuery> {
    filenames
        .iter()
        .filter_map(|filename| {
            let query = MovieQuery::from_filename(filename, language);
            if query.is_none() {
                warn!(file = %filename, "cannot parse filename, skipping");
            }
            query
        })
        .collect()
}
