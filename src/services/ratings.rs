//! Rating sources
//!
//! The predictor only ever sees "the current rating set". Where it comes from
//! (simulation, a file, a real ingestion pipeline) sits behind [`RatingSource`].

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::{
    error::{AppError, AppResult},
    models::{Rating, MAX_RATING, MIN_RATING},
};

/// Number of ratings the simulator produces
pub const SIMULATED_RATINGS: usize = 50;
/// Simulated user ids
pub const SIMULATED_USERS: RangeInclusive<i64> = 1..=10;
/// Simulated movie ids
pub const SIMULATED_MOVIES: RangeInclusive<i64> = 1..=20;

/// Supplies the rating set the collaborative predictor is trained on
pub trait RatingSource: Send + Sync {
    fn ratings(&self) -> AppResult<Vec<Rating>>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Draws `count` independent ratings. Duplicate (user, movie) pairs are kept.
pub fn simulate_ratings<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    users: RangeInclusive<i64>,
    movies: RangeInclusive<i64>,
) -> Vec<Rating> {
    (0..count)
        .map(|_| Rating {
            user_id: rng.gen_range(users.clone()),
            movie_id: rng.gen_range(movies.clone()),
            value: rng.gen_range(MIN_RATING..=MAX_RATING),
        })
        .collect()
}

/// Synthetic demo ratings: 50 draws over 10 users and 20 movies
#[derive(Debug, Clone, Default)]
pub struct SimulatedRatings {
    seed: Option<u64>,
}

impl SimulatedRatings {
    /// Unseeded simulator; every call produces a fresh set
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Reproducible simulator
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl RatingSource for SimulatedRatings {
    fn ratings(&self) -> AppResult<Vec<Rating>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(simulate_ratings(
            &mut rng,
            SIMULATED_RATINGS,
            SIMULATED_USERS,
            SIMULATED_MOVIES,
        ))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Fixed in-memory rating set
#[derive(Debug, Clone, Default)]
pub struct StaticRatings(pub Vec<Rating>);

impl RatingSource for StaticRatings {
    fn ratings(&self) -> AppResult<Vec<Rating>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// JSON array of `{user_id, movie_id, value}` records on disk
#[derive(Debug, Clone)]
pub struct JsonFileRatings {
    path: PathBuf,
}

impl JsonFileRatings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RatingSource for JsonFileRatings {
    fn ratings(&self) -> AppResult<Vec<Rating>> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::Catalog(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        parse_ratings(&raw)
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}

/// Parses a JSON rating array, rejecting values off the 1–5 scale
pub fn parse_ratings(raw: &str) -> AppResult<Vec<Rating>> {
    let ratings: Vec<Rating> = serde_json::from_str(raw)
        .map_err(|e| AppError::Catalog(format!("Invalid ratings JSON: {}", e)))?;

    if let Some(bad) = ratings.iter().find(|r| !r.is_on_scale()) {
        return Err(AppError::Catalog(format!(
            "Rating {} for user {} / movie {} is outside {}..={}",
            bad.value, bad.user_id, bad.movie_id, MIN_RATING, MAX_RATING
        )));
    }

    Ok(ratings)
}
