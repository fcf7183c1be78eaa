//! OMDb poster provider
//!
//! Queries `GET {api_url}/?apikey=..&t={title}[&y={year}]` and returns the `Poster`
//! field. MovieLens titles carry a trailing year and move leading articles to
//! the end ("Usual Suspects, The (1995)"), so they are normalized first.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    services::providers::PosterProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const POSTER_CACHE_TTL: u64 = 604800; // 1 week
const MISSING_POSTER: &str = "N/A";
const ARTICLES: [&str; 6] = ["The", "A", "An", "La", "Le", "Il"];

/// Subset of the OMDb title response we care about
#[derive(Debug, Clone, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

impl OmdbResponse {
    fn poster_url(self) -> Option<String> {
        if self.response.as_deref() == Some("False") {
            return None;
        }
        self.poster
            .filter(|p| !p.trim().is_empty() && p != MISSING_POSTER)
    }
}

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Option<Cache>,
}

impl OmdbProvider {
    pub fn new(api_key: String, api_url: String, cache: Option<Cache>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    async fn call_api(&self, title: &str) -> AppResult<Option<String>> {
        let (name, year) = normalize_title(title);
        let url = format!("{}/", self.api_url.trim_end_matches('/'));

        let mut query = vec![("apikey", self.api_key.clone()), ("t", name)];
        if let Some(year) = year {
            query.push(("y", year.to_string()));
        }

        let response = self.http_client.get(&url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        let body: OmdbResponse = response.json().await?;
        if let Some(error) = &body.error {
            tracing::debug!(title = %title, error = %error, "OMDb has no match");
        }

        Ok(body.poster_url())
    }
}

#[async_trait::async_trait]
impl PosterProvider for OmdbProvider {
    async fn fetch_poster(&self, title: &str) -> AppResult<Option<String>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Poster title cannot be empty".to_string(),
            ));
        }

        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::Poster(title.to_string()),
                POSTER_CACHE_TTL,
                self.call_api(title)
            ),
            None => self.call_api(title).await,
        }
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}

/// "Usual Suspects, The (1995)" → ("The Usual Suspects", Some(1995))
fn normalize_title(title: &str) -> (String, Option<u16>) {
    let mut name = title.trim();
    let mut year = None;

    if let Some(open) = name.rfind(" (") {
        let tail = &name[open + 2..];
        if let Some(digits) = tail.strip_suffix(')') {
            if let Ok(parsed) = digits.parse::<u16>() {
                year = Some(parsed);
                name = name[..open].trim_end();
            }
        }
    }

    for article in ARTICLES {
        if let Some(rest) = name.strip_suffix(article) {
            if let Some(rest) = rest.strip_suffix(", ") {
                return (format!("{} {}", article, rest), year);
            }
        }
    }

    (name.to_string(), year)
}
