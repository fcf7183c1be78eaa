use std::sync::Arc;
use std::time::Duration;

use reelmatch::{
    api::{create_router, AppState, SessionSettings},
    config::Config,
    db::{create_redis_client, load_catalog, Cache},
    services::{providers::OmdbProvider, Recommender},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Catalog load and matrix build are the only heavy work; both happen once
    let catalog = load_catalog(&config.catalog_path)?;
    let vectorizer = config.vectorizer();
    let recommender = tokio::task::spawn_blocking(move || Recommender::build(catalog, &vectorizer))
        .await??;

    let settings = SessionSettings::from(&config);
    let mut state = AppState::new(Arc::new(recommender), settings);
    state
        .sessions
        .clone()
        .spawn_sweeper(settings.session_idle_ttl.min(Duration::from_secs(60)));

    let mut cache_handle = None;
    let cache = match &config.redis_url {
        Some(url) => {
            let (cache, handle) = Cache::new(create_redis_client(url)?);
            cache_handle = Some(handle);
            tracing::info!("Poster cache enabled");
            Some(cache)
        }
        None => None,
    };

    match &config.omdb_api_key {
        Some(api_key) => {
            let provider = OmdbProvider::new(api_key.clone(), config.omdb_api_url.clone(), cache);
            state = state.with_posters(Arc::new(provider));
            tracing::info!("OMDb poster provider enabled");
        }
        None => tracing::info!("OMDB_API_KEY not set, serving titles without posters"),
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
