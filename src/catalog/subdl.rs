/// Subdl catalog implementation.
use super::{CatalogError, FilmIdentifier, SearchRequest, SearchResponse, SubtitleCatalog};
use async_trait::async_trait;

/// Production endpoint of the subdl search API.
const SUBDL_API_URL: &str = "https://api.subdl.com/api/v1/subtitles";

/// Page-size cap for every search request.
const SUBS_PER_PAGE: &str = "30";

/// Subtitle catalog backed by the subdl API.
pub struct SubdlCatalog {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SubdlCatalog {
    /// Creates a catalog client against the production endpoint.
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, SUBDL_API_URL)
    }

    /// Creates a catalog client against a custom endpoint (used by tests).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl SubtitleCatalog for SubdlCatalog {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, CatalogError> {
        let mut params: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("languages", request.language.clone()),
            ("subs_per_page", SUBS_PER_PAGE.to_string()),
        ];

        match &request.identifier {
            FilmIdentifier::Name(name) => params.push(("film_name", name.clone())),
            FilmIdentifier::CatalogId(id) => params.push(("sd_id", id.to_string())),
            FilmIdentifier::CrossReferenceId(id) => params.push(("imdb_id", id.clone())),
        }

        match &request.series {
            Some(series) => {
                params.push(("type", "tv".to_string()));
                params.push(("season_number", series.season.to_string()));
                params.push(("episode_number", series.episode.to_string()));
            }
            None => params.push(("type", "movie".to_string())),
        }

        if let Some(year) = request.year {
            params.push(("year", year.to_string()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| CatalogError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }
}
