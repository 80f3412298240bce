use std::{path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinemix_api::{
    config::Config,
    db::{create_redis_client, Cache, CacheWriterHandle},
    routes::{create_router, AppState, RequestDefaults},
    services::{
        catalog,
        hybrid::Weights,
        posters::{NoPosters, PosterProvider, TmdbPosterProvider},
        ratings::{JsonFileRatings, RatingSource, SimulatedRatings},
        RecommendationEngine,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinemix_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let catalog = match (&config.movies_path, &config.credits_path) {
        (Some(movies), Some(credits)) => {
            catalog::load_catalog(Path::new(movies), Path::new(credits))
                .context("Failed to load movie catalog")?
        }
        _ => {
            tracing::info!("MOVIES_PATH not set, using the embedded demo catalog");
            catalog::demo_catalog().context("Failed to load demo catalog")?
        }
    };

    let ratings: Box<dyn RatingSource> = match (&config.ratings_path, config.rng_seed) {
        (Some(path), _) => Box::new(JsonFileRatings::new(path)),
        (None, Some(seed)) => Box::new(SimulatedRatings::seeded(seed)),
        (None, None) => Box::new(SimulatedRatings::new()),
    };

    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let engine_config = config.engine_config();
    let engine = tokio::task::spawn_blocking(move || {
        RecommendationEngine::from_source(catalog, ratings.as_ref(), &engine_config, &mut rng)
    })
    .await
    .context("Engine build task failed")?
    .context("Failed to build recommendation engine")?;

    let (posters, cache_handle) = poster_provider(&config).await?;
    tracing::info!(provider = posters.name(), "Poster provider ready");

    let defaults = RequestDefaults {
        count: config.recommendation_count,
        weights: Weights::new(config.content_weight, config.collab_weight)?,
        ..RequestDefaults::default()
    };
    let state = AppState::new(Arc::new(engine), posters)
        .with_defaults(defaults)
        .with_rng_seed(config.rng_seed)
        .with_poster_timeout(Duration::from_millis(config.poster_timeout_ms));
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

/// TMDB posters when an API key is configured, with an optional Redis cache
async fn poster_provider(
    config: &Config,
) -> anyhow::Result<(Arc<dyn PosterProvider>, Option<CacheWriterHandle>)> {
    let Some(api_key) = config.tmdb_api_key.clone() else {
        tracing::info!("TMDB_API_KEY not set, recommendations are served without posters");
        return Ok((Arc::new(NoPosters), None));
    };

    let (cache, handle) = match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url)?;
            let (cache, handle) = Cache::new(client).await;
            (Some(cache), Some(handle))
        }
        None => (None, None),
    };

    let provider = TmdbPosterProvider::new(
        api_key,
        config.tmdb_api_url.clone(),
        config.tmdb_image_base_url.clone(),
        Duration::from_millis(config.poster_timeout_ms),
        cache,
    )?;

    Ok((Arc::new(provider), handle))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
