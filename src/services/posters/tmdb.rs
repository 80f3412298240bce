//! TMDB poster provider
//!
//! Searches `/search/movie` by title and builds the artwork URL from the
//! first hit's `poster_path`. The HTTP client carries a short timeout so a
//! slow TMDB never holds up a recommendation.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    services::posters::PosterProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

const POSTER_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    poster_path: Option<String>,
}

#[derive(Clone)]
pub struct TmdbPosterProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
    cache: Option<Cache>,
}

impl TmdbPosterProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        image_base_url: String,
        timeout: Duration,
        cache: Option<Cache>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            image_base_url,
            cache,
        })
    }

    /// Poster URL of the first search hit
    fn poster_url(&self, response: SearchResponse) -> Option<String> {
        response
            .results
            .into_iter()
            .next()
            .and_then(|hit| hit.poster_path)
            .map(|path| format!("{}{}", self.image_base_url, path))
    }

    async fn search_poster(&self, title: &str) -> AppResult<Option<String>> {
        let url = format!("{}/search/movie", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", title)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        let search: SearchResponse = response.json().await?;
        let poster = self.poster_url(search);

        tracing::debug!(
            title = %title,
            found = poster.is_some(),
            provider = "tmdb",
            "Poster search completed"
        );

        Ok(poster)
    }
}

#[async_trait::async_trait]
impl PosterProvider for TmdbPosterProvider {
    async fn fetch_poster(&self, title: &str) -> AppResult<Option<String>> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::Poster(title.to_string()),
                POSTER_CACHE_TTL,
                self.search_poster(title)
            ),
            None => self.search_poster(title).await,
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_url: &str) -> TmdbPosterProvider {
        TmdbPosterProvider::new(
            "test_key".to_string(),
            api_url.to_string(),
            "https://image.tmdb.org/t/p/w500".to_string(),
            Duration::from_millis(200),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_poster_url_from_first_result() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"page": 1, "results": [{"id": 19995, "poster_path": "/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"}, {"poster_path": "/other.jpg"}]}"#,
        )
        .unwrap();

        assert_eq!(
            provider("http://test.local").poster_url(response),
            Some("https://image.tmdb.org/t/p/w500/kyeqWdyUXW608qlYkRqosgbbJyK.jpg".to_string())
        );
    }

    #[test]
    fn test_poster_url_no_results() {
        let response: SearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(provider("http://test.local").poster_url(response), None);
    }

    #[test]
    fn test_poster_url_null_path() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"results": [{"poster_path": null}]}"#).unwrap();
        assert_eq!(provider("http://test.local").poster_url(response), None);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error_not_a_panic() {
        // Port 9 (discard) on localhost is closed in test environments
        let result = provider("http://127.0.0.1:9").fetch_poster("Avatar").await;
        assert!(result.is_err());
    }
}
