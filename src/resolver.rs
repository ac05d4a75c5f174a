//! Staged identity resolution
//!
//! Turns an ambiguous parsed title into an authoritative subtitle-candidate
//! list. The free-text search is only trusted when one of its identities
//! matches the query title exactly; otherwise the secondary metadata provider
//! is consulted for a cross-reference id. Either way the terminal candidate
//! list always comes from a search keyed by an id, never by free text.

use crate::catalog::{CatalogError, FilmIdentifier, SubtitleCandidate, SubtitleCatalog};
use crate::cross_reference::{CrossReference, CrossReferenceError};
use crate::movie_query::MovieQuery;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither resolution stage produced an identifier
    #[error("Movie not found: {0}")]
    MovieNotFound(String),

    /// The terminal search returned an empty subtitle list
    #[error("No subtitles available for: {0}")]
    NoSubtitles(String),

    /// Catalog round-trip failed
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cross-reference lookup failed
    #[error("Cross-reference error: {0}")]
    CrossReference(#[from] CrossReferenceError),
}

/// Resolution progress for one query. The `Disambiguating` state is entered
/// at most once, which bounds the pipeline at two catalog round-trips.
enum ResolutionState {
    Searching,
    Disambiguating(FilmIdentifier),
    Resolved(Vec<SubtitleCandidate>),
    Failed,
}

/// Resolves a [`MovieQuery`] to a non-empty subtitle-candidate list.
pub struct Resolver {
    catalog: Arc<dyn SubtitleCatalog>,
    cross_reference: Arc<dyn CrossReference>,
}

impl Resolver {
    pub fn new(catalog: Arc<dyn SubtitleCatalog>, cross_reference: Arc<dyn CrossReference>) -> Self {
        Self {
            catalog,
            cross_reference,
        }
    }

    /// Runs the staged lookup for one query.
    ///
    /// Issues at most two catalog round-trips and at most one cross-reference
    /// round-trip. Any transport or decode failure fails this query only.
    pub async fn resolve(&self, query: &MovieQuery) -> Result<Vec<SubtitleCandidate>, ResolveError> {
        let mut state = ResolutionState::Searching;

        loop {
            state = match state {
                ResolutionState::Searching => {
                    let request =
                        query.search_request(FilmIdentifier::Name(query.title.clone()));
                    let response = self.catalog.search(&request).await?;

                    match response.results.iter().find(|r| r.name == query.title) {
                        Some(hit) => {
                            ResolutionState::Disambiguating(FilmIdentifier::CatalogId(hit.sd_id))
                        }
                        None => {
                            match self.cross_reference.lookup(&query.title, query.year).await? {
                                Some(id) => ResolutionState::Disambiguating(
                                    FilmIdentifier::CrossReferenceId(id),
                                ),
                                None => ResolutionState::Failed,
                            }
                        }
                    }
                }
                ResolutionState::Disambiguating(identifier) => {
                    let response = self.catalog.search(&query.search_request(identifier)).await?;
                    ResolutionState::Resolved(response.subtitles)
                }
                ResolutionState::Resolved(subtitles) => {
                    if subtitles.is_empty() {
                        return Err(ResolveError::NoSubtitles(query.title.clone()));
                    }
                    return Ok(subtitles);
                }
                ResolutionState::Failed => {
                    return Err(ResolveError::MovieNotFound(query.title.clone()));
                }
            };
        }
    }
}
