//! Poster image providers
//!
//! Posters are purely presentational: the recommendation engine never depends on
//! them. Any provider failure is logged and the affected title is returned
//! without an image.
use std::sync::Arc;

use crate::{error::AppResult, models::Recommendation};

pub mod omdb;

pub use omdb::OmdbProvider;

/// Looks up a poster image URL for a display title
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    /// `Ok(None)` when the provider knows no poster for the title
    async fn fetch_poster(&self, title: &str) -> AppResult<Option<String>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Fills in `poster_url` for every recommendation, fetching in parallel
///
/// Never fails: lookup errors and panicked tasks leave the URL as `None`.
pub async fn attach_posters(provider: Arc<dyn PosterProvider>, items: &mut [Recommendation]) {
    let mut tasks = Vec::with_capacity(items.len());

    for item in items.iter() {
        let provider = provider.clone();
        let title = item.title.clone();
        tasks.push(tokio::spawn(async move {
            provider.fetch_poster(&title).await
        }));
    }

    let mut failures = 0usize;
    for (item, task) in items.iter_mut().zip(tasks) {
        item.poster_url = match task.await {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => {
                tracing::warn!(
                    provider = provider.name(),
                    title = %item.title,
                    error = %e,
                    "Poster lookup failed"
                );
                failures += 1;
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Poster task join error");
                failures += 1;
                None
            }
        };
    }

    if failures > 0 {
        tracing::warn!(
            provider = provider.name(),
            requested = items.len(),
            failures,
            "Partial poster lookup failure"
        );
    }
}
