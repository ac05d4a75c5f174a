//! Secondary metadata lookup
//!
//! When the catalog's free-text search has no exact-title hit, the title is
//! looked up against a secondary metadata provider (OMDb) to obtain a
//! cross-reference id the catalog does understand.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Production endpoint of the OMDb API.
const OMDB_API_URL: &str = "https://www.omdbapi.com/";

/// Errors that can occur during a cross-reference lookup.
#[derive(Debug, Error)]
pub enum CrossReferenceError {
    /// Request to the metadata provider failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Failed to parse the provider's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

/// Trait for providers that can map a title/year pair to a cross-reference id.
#[async_trait]
pub trait CrossReference: Send + Sync {
    /// Looks up a title and returns its cross-reference id, if the provider
    /// knows one.
    async fn lookup(
        &self,
        title: &str,
        year: Option<u16>,
    ) -> Result<Option<String>, CrossReferenceError>;
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(default)]
    imdb_id: Option<String>,
}

/// Cross-reference provider backed by the OMDb API.
pub struct OmdbProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OmdbProvider {
    /// Creates a provider against the production endpoint.
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, OMDB_API_URL)
    }

    /// Creates a provider against a custom endpoint (used by tests).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl CrossReference for OmdbProvider {
    async fn lookup(
        &self,
        title: &str,
        year: Option<u16>,
    ) -> Result<Option<String>, CrossReferenceError> {
        let mut params: Vec<(&str, String)> = vec![
            ("apikey", self.api_key.clone()),
            ("t", title.to_string()),
        ];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| CrossReferenceError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CrossReferenceError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: OmdbResponse = response
            .json()
            .await
            .map_err(|e| CrossReferenceError::ParseError(e.to_string()))?;

        Ok(body.imdb_id.filter(|id| !id.is_empty()))
    }
}
