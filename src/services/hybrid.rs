//! Merging of content-based and collaborative candidate lists.

use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use std::collections::HashSet;

use crate::error::{AppError, AppResult};

/// Decides whether a collaborative candidate is thematically close enough to
/// the queried movie to be shown next to it
pub trait ThematicRelevanceFilter: Send + Sync {
    fn is_relevant(&self, query_tags: &str, candidate_tags: &str) -> bool;

    fn name(&self) -> &'static str;
}

/// Keeps a candidate when the query's whole tag string occurs inside the
/// candidate's tag string. Coarse: it almost never matches unless the two
/// movies share long runs of identical tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringOverlap;

impl ThematicRelevanceFilter for SubstringOverlap {
    fn is_relevant(&self, query_tags: &str, candidate_tags: &str) -> bool {
        candidate_tags.contains(query_tags)
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// Keeps a candidate sharing at least one tag token with the query
#[derive(Debug, Clone, Copy, Default)]
pub struct TagIntersection;

impl ThematicRelevanceFilter for TagIntersection {
    fn is_relevant(&self, query_tags: &str, candidate_tags: &str) -> bool {
        let query: HashSet<&str> = query_tags.split_whitespace().collect();
        candidate_tags
            .split_whitespace()
            .any(|tag| query.contains(tag))
    }

    fn name(&self) -> &'static str {
        "tag_intersection"
    }
}

/// Configurable choice of [`ThematicRelevanceFilter`]
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceFilterKind {
    #[default]
    Substring,
    TagIntersection,
}

impl RelevanceFilterKind {
    pub fn build(self) -> Box<dyn ThematicRelevanceFilter> {
        match self {
            RelevanceFilterKind::Substring => Box::new(SubstringOverlap),
            RelevanceFilterKind::TagIntersection => Box::new(TagIntersection),
        }
    }
}

/// Relative weight of the content and collaborative lists
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub content: f64,
    pub collab: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            content: 0.6,
            collab: 0.4,
        }
    }
}

impl Weights {
    /// Largest accepted weight for either list
    pub const MAX: f64 = 1.0;

    pub fn new(content: f64, collab: f64) -> AppResult<Self> {
        for (name, value) in [("content_weight", content), ("collab_weight", collab)] {
            if !value.is_finite() || !(0.0..=Self::MAX).contains(&value) {
                return Err(AppError::InvalidInput(format!(
                    "{} must be a number between 0 and {}, got {}",
                    name,
                    Self::MAX,
                    value
                )));
            }
        }
        Ok(Self { content, collab })
    }

    /// Times each list is repeated in the combined sequence
    pub fn repetitions(&self) -> (usize, usize) {
        (repetition(self.content), repetition(self.collab))
    }
}

fn repetition(weight: f64) -> usize {
    if weight.is_finite() && weight > 0.0 {
        (weight.min(Weights::MAX) * 10.0).round() as usize
    } else {
        0
    }
}

/// Combines both lists into at most `n` unique titles.
///
/// Repeating a list and then deduplicating keeps only its first pass, so the
/// repetition counts only decide which list leads (content on ties) and
/// whether a list with zero repetitions takes part at all. Each list is
/// walked once.
pub fn interleave(content: &[String], collab: &[String], weights: Weights, n: usize) -> Vec<String> {
    let (content_reps, collab_reps) = weights.repetitions();

    let content_block = content.iter().take(if content_reps > 0 { content.len() } else { 0 });
    let collab_block = collab.iter().take(if collab_reps > 0 { collab.len() } else { 0 });

    let (first, second) = if collab_reps > content_reps {
        (collab_block, content_block)
    } else {
        (content_block, collab_block)
    };

    let mut seen = HashSet::new();
    first
        .chain(second)
        .filter(|title| seen.insert(title.as_str()))
        .take(n)
        .cloned()
        .collect()
}

/// Shuffles the collaborative titles, then interleaves
pub fn merge<R: Rng + ?Sized>(
    content: &[String],
    mut collab: Vec<String>,
    weights: Weights,
    n: usize,
    rng: &mut R,
) -> Vec<String> {
    collab.shuffle(rng);
    interleave(content, &collab, weights, n)
}
