//! Poster artwork lookup
//!
//! Posters decorate a recommendation but never decide it: every failure here
//! ends up as a `null` poster, never as a failed request.
use crate::{error::AppResult, models::RecommendedMovie};
use std::{sync::Arc, time::Duration};

pub mod tmdb;

pub use tmdb::TmdbPosterProvider;

/// Trait for poster artwork providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    /// Poster URL for a movie title, `None` when the provider has no artwork
    async fn fetch_poster(&self, title: &str) -> AppResult<Option<String>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Provider used when no poster service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPosters;

#[async_trait::async_trait]
impl PosterProvider for NoPosters {
    async fn fetch_poster(&self, _title: &str) -> AppResult<Option<String>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Looks up posters for all titles in parallel, keeping title order.
///
/// Each lookup, cache round trip included, is bounded by `timeout`. Provider
/// errors, timeouts and failed tasks are logged and turned into `None`.
pub async fn attach_posters(
    provider: Arc<dyn PosterProvider>,
    titles: Vec<String>,
    timeout: Duration,
) -> Vec<RecommendedMovie> {
    let mut tasks = Vec::with_capacity(titles.len());

    for title in titles {
        let provider = provider.clone();
        let lookup_title = title.clone();
        let task = tokio::spawn(async move {
            tokio::time::timeout(timeout, provider.fetch_poster(&lookup_title)).await
        });
        tasks.push((title, task));
    }

    let mut results = Vec::with_capacity(tasks.len());

    for (title, task) in tasks {
        let poster_url = match task.await {
            Ok(Ok(Ok(url))) => url,
            Ok(Ok(Err(e))) => {
                tracing::warn!(
                    error = %e,
                    title = %title,
                    provider = provider.name(),
                    "Poster lookup failed"
                );
                None
            }
            Ok(Err(_)) => {
                tracing::warn!(
                    title = %title,
                    provider = provider.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Poster lookup timed out"
                );
                None
            }
            Err(e) => {
                tracing::error!(error = %e, title = %title, "Poster task join error");
                None
            }
        };
        results.push(RecommendedMovie { title, poster_url });
    }

    results
}
