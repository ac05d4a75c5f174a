/// Data structures and traits for the subtitle catalog.
///
/// The catalog is queried by exactly one film identifier at a time. The
/// identifier kinds carry a strict priority (cross-reference id over catalog
/// id over free-text title), which is made structural here: a search request
/// holds a single [`FilmIdentifier`] variant, so a higher-priority id can
/// never be sent alongside a lower-priority one.
mod subdl;

pub use subdl::SubdlCatalog;

use crate::movie_query::SeriesInfo;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while querying the subtitle catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Request to the catalog failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Failed to parse the catalog's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

/// The single identifier a catalog search is keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilmIdentifier {
    /// Free-text title search
    Name(String),
    /// Numeric id assigned by the catalog itself
    CatalogId(u64),
    /// Id from the secondary metadata provider
    CrossReferenceId(String),
}

/// One catalog search, keyed by exactly one identifier.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub identifier: FilmIdentifier,
    /// Preferred subtitle language code
    pub language: String,
    /// Season/episode context for episodic queries
    pub series: Option<SeriesInfo>,
    /// Release year, when the filename carried one
    pub year: Option<u16>,
}

/// A candidate film/show identity returned by the catalog's free-text search.
///
/// Only used to find an exact-title match and extract its numeric id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
    /// Numeric id assigned by the catalog
    #[serde(default)]
    pub sd_id: u64,
    /// Identity kind as reported by the catalog ("movie" or "tv")
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Display name, compared against the query title
    #[serde(default)]
    pub name: String,
    /// Cross-reference id known to the catalog, if any
    #[serde(default)]
    pub imdb_id: Option<String>,
    /// Release year
    #[serde(default)]
    pub year: Option<u16>,
}

/// A subtitle offered by the catalog. Immutable once received.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubtitleCandidate {
    /// The file-like description the provider uses for matching
    #[serde(default)]
    pub release_name: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Subtitle language
    #[serde(default)]
    pub lang: String,
    /// Download URL, relative to the provider's download base
    #[serde(default)]
    pub url: String,
    /// Season the subtitle covers
    #[serde(default)]
    pub season: u32,
    /// Episode the subtitle covers; absent for full-season releases
    #[serde(default)]
    pub episode: Option<u32>,
    /// Whether the subtitle covers an entire season
    #[serde(default)]
    pub full_season: bool,
}

/// A catalog search response: identities plus an opportunistic subtitle list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleCandidate>,
}

/// Trait for subtitle catalog backends.
#[async_trait]
pub trait SubtitleCatalog: Send + Sync {
    /// Performs one catalog search round-trip.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, CatalogError>;
}
