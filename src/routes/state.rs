use std::{sync::Arc, time::Duration};

use rand::{rngs::StdRng, SeedableRng};

use crate::services::{hybrid::Weights, PosterProvider, RecommendationEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub posters: Arc<dyn PosterProvider>,
    pub defaults: RequestDefaults,
    /// Fixed seed for per-request randomness, entropy when unset
    pub rng_seed: Option<u64>,
    /// Upper bound on one poster lookup, cache included
    pub poster_timeout: Duration,
}

/// Poster lookup bound when none is configured
pub const DEFAULT_POSTER_TIMEOUT: Duration = Duration::from_secs(3);

/// Values used when a request leaves a parameter out
#[derive(Debug, Clone, Copy)]
pub struct RequestDefaults {
    pub user_id: i64,
    pub count: usize,
    pub weights: Weights,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            user_id: 1,
            count: 5,
            weights: Weights::default(),
        }
    }
}

impl AppState {
    pub fn new(engine: Arc<RecommendationEngine>, posters: Arc<dyn PosterProvider>) -> Self {
        Self {
            engine,
            posters,
            defaults: RequestDefaults::default(),
            rng_seed: None,
            poster_timeout: DEFAULT_POSTER_TIMEOUT,
        }
    }

    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_rng_seed(mut self, seed: Option<u64>) -> Self {
        self.rng_seed = seed;
        self
    }

    pub fn with_poster_timeout(mut self, timeout: Duration) -> Self {
        self.poster_timeout = timeout;
        self
    }

    /// Fresh random source for one request
    pub fn request_rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
