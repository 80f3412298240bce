//! Content similarity index
//!
//! Bag-of-words vectors over the movies' tag strings and the full pairwise
//! cosine similarity matrix. Built once, read-only afterwards.

use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::Movie,
    services::stopwords::is_stop_word,
};

/// What to do when two movies share a normalized title
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TitleCollisionPolicy {
    /// The first movie in corpus order owns the title
    #[default]
    KeepFirst,
    /// Refuse to build the index
    Reject,
}

/// Token → column mapping shared by all tag vectors
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Keeps the `max_features` most frequent tokens of the corpus.
    /// Frequency ties are broken alphabetically.
    fn fit(documents: &[String], max_features: usize) -> Self {
        let mut frequencies: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            for token in tokenize(doc) {
                *frequencies.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = frequencies.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        let index = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        Self { terms, index }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    /// Count vector of a document. Out-of-vocabulary tokens are ignored.
    fn vectorize(&self, document: &str) -> TagVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokenize(document) {
            if let Some(idx) = self.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f32)> = counts.into_iter().collect();
        entries.sort_by_key(|(idx, _)| *idx);
        let norm = entries.iter().map(|(_, c)| c * c).sum::<f32>().sqrt();

        TagVector { entries, norm }
    }
}

/// Sparse count vector of one movie over the vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct TagVector {
    /// `(column, count)` pairs sorted by column
    entries: Vec<(usize, f32)>,
    norm: f32,
}

impl TagVector {
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count for one vocabulary column
    pub fn count(&self, column: usize) -> f32 {
        self.entries
            .binary_search_by_key(&column, |(idx, _)| *idx)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Fixed-length form over a vocabulary of `len` columns
    pub fn to_dense(&self, len: usize) -> Array1<f32> {
        let mut dense = Array1::<f32>::zeros(len);
        for &(idx, count) in &self.entries {
            if idx < len {
                dense[idx] = count;
            }
        }
        dense
    }

    fn dot(&self, other: &TagVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a) = self.entries[i];
            let (b_idx, b) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a * b;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity; 0 when either vector is all zero
    pub fn cosine(&self, other: &TagVector) -> f32 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        (self.dot(other) / (self.norm * other.norm)).clamp(0.0, 1.0)
    }
}

/// Splits text into lowercase word tokens of at least two characters
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|token| !is_stop_word(token))
}

/// Content-based lookup structure over the whole corpus
#[derive(Debug, Clone)]
pub struct ContentIndex {
    movies: Vec<Movie>,
    title_index: HashMap<String, usize>,
    id_index: HashMap<i64, usize>,
    vocabulary: Vocabulary,
    vectors: Vec<TagVector>,
    similarity: Array2<f32>,
}

impl ContentIndex {
    /// Builds the vocabulary, tag vectors and similarity matrix
    pub fn build(
        movies: Vec<Movie>,
        max_features: usize,
        policy: TitleCollisionPolicy,
    ) -> AppResult<Self> {
        let title_index = build_title_index(&movies, policy)?;

        let mut id_index = HashMap::new();
        for (pos, movie) in movies.iter().enumerate() {
            id_index.entry(movie.id).or_insert(pos);
        }

        let documents: Vec<String> = movies.iter().map(Movie::tag_string).collect();
        let vocabulary = Vocabulary::fit(&documents, max_features);
        let vectors: Vec<TagVector> = documents
            .iter()
            .map(|doc| vocabulary.vectorize(doc))
            .collect();

        let n = vectors.len();
        let mut similarity = Array2::<f32>::zeros((n, n));
        for i in 0..n {
            similarity[[i, i]] = if vectors[i].is_zero() { 0.0 } else { 1.0 };
            for j in (i + 1)..n {
                let sim = vectors[i].cosine(&vectors[j]);
                similarity[[i, j]] = sim;
                similarity[[j, i]] = sim;
            }
        }

        tracing::info!(
            movies = n,
            vocabulary = vocabulary.len(),
            "Content index built"
        );

        Ok(Self {
            movies,
            title_index,
            id_index,
            vocabulary,
            vectors,
            similarity,
        })
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn vector(&self, position: usize) -> Option<&TagVector> {
        self.vectors.get(position)
    }

    /// Corpus position of a title (case-insensitive)
    pub fn position(&self, title: &str) -> Option<usize> {
        self.title_index.get(&Movie::title_key(title)).copied()
    }

    pub fn movie(&self, title: &str) -> Option<&Movie> {
        self.position(title).map(|pos| &self.movies[pos])
    }

    pub fn movie_by_id(&self, id: i64) -> Option<&Movie> {
        self.id_index.get(&id).map(|&pos| &self.movies[pos])
    }

    /// Similarity of two corpus positions
    pub fn similarity(&self, i: usize, j: usize) -> f32 {
        self.similarity[[i, j]]
    }

    pub fn similarity_between(&self, a: &str, b: &str) -> Option<f32> {
        Some(self.similarity(self.position(a)?, self.position(b)?))
    }

    /// The `n` movies most similar to `title`, excluding itself.
    /// Equal scores keep corpus order.
    pub fn recommend_content_based(&self, title: &str, n: usize) -> AppResult<Vec<&Movie>> {
        let idx = self.position(title).ok_or_else(|| {
            AppError::NotFound(format!(
                "'{}' not found in the database",
                Movie::title_key(title)
            ))
        })?;

        let mut scored: Vec<(usize, f32)> = self
            .similarity
            .row(idx)
            .iter()
            .copied()
            .enumerate()
            .filter(|(pos, _)| *pos != idx)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(n)
            .map(|(pos, _)| &self.movies[pos])
            .collect())
    }

    /// Up to `limit` titles containing `partial` (case-insensitive), corpus order
    pub fn suggestions(&self, partial: &str, limit: usize) -> Vec<String> {
        let needle = Movie::title_key(partial);
        self.movies
            .iter()
            .filter(|movie| movie.key().contains(&needle))
            .take(limit)
            .map(|movie| movie.title.clone())
            .collect()
    }
}

fn build_title_index(
    movies: &[Movie],
    policy: TitleCollisionPolicy,
) -> AppResult<HashMap<String, usize>> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(movies.len());

    for (pos, movie) in movies.iter().enumerate() {
        let key = movie.key();
        if let Some(&first) = index.get(&key) {
            match policy {
                TitleCollisionPolicy::KeepFirst => {
                    tracing::warn!(
                        title = %movie.title,
                        kept_id = movies[first].id,
                        ignored_id = movie.id,
                        "Duplicate title, keeping first occurrence"
                    );
                }
                TitleCollisionPolicy::Reject => {
                    return Err(AppError::Catalog(format!(
                        "duplicate title '{}' (ids {} and {})",
                        movie.title, movies[first].id, movie.id
                    )));
                }
            }
            continue;
        }
        index.insert(key, pos);
    }

    Ok(index)
}
