//! Metadata normalization
//!
//! Turns raw genre, keyword, cast, crew and overview fields into the flat tag
//! sequence the content index is built from. Multi-word names are collapsed
//! ("Science Fiction" → "sciencefiction") so they survive tokenization as a
//! single feature.

use crate::models::{CrewMember, Movie, NamedEntry, RawMovie};

/// Number of leading cast members kept per movie
pub const TOP_CAST: usize = 3;

const DIRECTOR_JOB: &str = "Director";

/// Result of normalizing a batch of raw records
#[derive(Debug, Default)]
pub struct NormalizedCorpus {
    pub movies: Vec<Movie>,
    /// Records dropped because a required field was missing
    pub dropped: usize,
}

/// Normalizes every record, dropping the incomplete ones
pub fn normalize_all(records: Vec<RawMovie>) -> NormalizedCorpus {
    let mut corpus = NormalizedCorpus::default();

    for record in records {
        match normalize(record) {
            Some(movie) => corpus.movies.push(movie),
            None => corpus.dropped += 1,
        }
    }

    corpus
}

/// Normalizes one record. Returns `None` when any required field is missing.
pub fn normalize(record: RawMovie) -> Option<Movie> {
    let RawMovie {
        movie_id,
        title,
        overview,
        genres,
        keywords,
        cast,
        crew,
    } = record;

    let (Some(id), Some(title), Some(overview), Some(genres), Some(keywords), Some(cast), Some(crew)) =
        (movie_id, title, overview, genres, keywords, cast, crew)
    else {
        tracing::debug!("Dropping movie record with missing fields");
        return None;
    };

    let mut tags: Vec<String> = overview.split_whitespace().map(str::to_string).collect();
    tags.extend(collapse_names(&genres));
    tags.extend(collapse_names(&keywords));
    tags.extend(collapse_names(top_cast(&cast)));
    tags.extend(director(&crew).iter().map(|name| collapse(name)));

    Some(Movie {
        id,
        title,
        tags: tags.into_iter().map(|tag| tag.to_lowercase()).collect(),
    })
}

fn top_cast(cast: &[NamedEntry]) -> &[NamedEntry] {
    &cast[..cast.len().min(TOP_CAST)]
}

/// First credited director, if any
fn director(crew: &[CrewMember]) -> Vec<String> {
    crew.iter()
        .find(|member| member.job.as_deref() == Some(DIRECTOR_JOB))
        .map(|member| vec![member.name.clone()])
        .unwrap_or_default()
}

fn collapse_names(entries: &[NamedEntry]) -> impl Iterator<Item = String> + '_ {
    entries.iter().map(|entry| collapse(&entry.name))
}

/// Removes all whitespace from a name
fn collapse(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}
