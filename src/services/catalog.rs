//! Movie catalog ingestion
//!
//! Reads the movie metadata and credits records and joins them on title into
//! [`RawMovie`] rows for the normalizer. A small demo catalog is compiled in so
//! the service can start without any data files.

use std::collections::HashMap;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{CreditsRecord, MovieRecord, RawMovie},
};

const DEMO_MOVIES: &str = include_str!("../../data/demo_movies.json");
const DEMO_CREDITS: &str = include_str!("../../data/demo_credits.json");

/// Inner join of movies and credits on exact title.
///
/// Movie order is preserved; a movie matching several credits rows yields one
/// row per match. Rows without a title on either side never match.
pub fn join_credits(movies: Vec<MovieRecord>, credits: Vec<CreditsRecord>) -> Vec<RawMovie> {
    let mut by_title: HashMap<String, Vec<CreditsRecord>> = HashMap::new();
    for record in credits {
        if let Some(title) = record.title.clone() {
            by_title.entry(title).or_default().push(record);
        }
    }

    let mut joined = Vec::with_capacity(movies.len());
    for movie in movies {
        let Some(matches) = movie.title.as_ref().and_then(|t| by_title.get(t)) else {
            continue;
        };
        for credits in matches {
            joined.push(RawMovie {
                movie_id: movie.movie_id,
                title: movie.title.clone(),
                overview: movie.overview.clone(),
                genres: movie.genres.clone(),
                keywords: movie.keywords.clone(),
                cast: credits.cast.clone(),
                crew: credits.crew.clone(),
            });
        }
    }

    joined
}

/// Parses movie and credits JSON arrays and joins them
pub fn parse_catalog(movies_json: &str, credits_json: &str) -> AppResult<Vec<RawMovie>> {
    let movies: Vec<MovieRecord> = serde_json::from_str(movies_json)
        .map_err(|e| AppError::Catalog(format!("Invalid movies JSON: {}", e)))?;
    let credits: Vec<CreditsRecord> = serde_json::from_str(credits_json)
        .map_err(|e| AppError::Catalog(format!("Invalid credits JSON: {}", e)))?;

    let movie_count = movies.len();
    let joined = join_credits(movies, credits);

    tracing::info!(
        movies = movie_count,
        joined = joined.len(),
        "Catalog records joined on title"
    );

    Ok(joined)
}

/// Loads the catalog from a movies file and a credits file
pub fn load_catalog(movies_path: &Path, credits_path: &Path) -> AppResult<Vec<RawMovie>> {
    let movies = read_file(movies_path)?;
    let credits = read_file(credits_path)?;
    parse_catalog(&movies, &credits)
}

/// The compiled-in demo catalog
pub fn demo_catalog() -> AppResult<Vec<RawMovie>> {
    parse_catalog(DEMO_MOVIES, DEMO_CREDITS)
}

fn read_file(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| AppError::Catalog(format!("Failed to read {}: {}", path.display(), e)))
}
