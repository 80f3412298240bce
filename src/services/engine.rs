//! Hybrid recommendation engine
//!
//! Built once at startup from the catalog and the rating set, then shared
//! read-only between requests. Per-request randomness is passed in by the
//! caller so results can be pinned in tests.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{RawMovie, Rating},
    services::{
        hybrid::{self, RelevanceFilterKind, ThematicRelevanceFilter, Weights},
        normalizer,
        predictor::{self, RatingModel, SvdConfig},
        ratings::RatingSource,
        similarity::{ContentIndex, TitleCollisionPolicy},
    },
};

/// Engine build settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Vocabulary size of the content index
    pub max_features: usize,
    pub collision_policy: TitleCollisionPolicy,
    pub relevance_filter: RelevanceFilterKind,
    pub svd: SvdConfig,
    /// Share of ratings held out to measure prediction error
    pub holdout_fraction: f64,
    /// Collaborative pool size as a multiple of the requested count
    pub candidate_multiplier: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            collision_policy: TitleCollisionPolicy::default(),
            relevance_filter: RelevanceFilterKind::default(),
            svd: SvdConfig::default(),
            holdout_fraction: 0.2,
            candidate_multiplier: 3,
        }
    }
}

/// One hybrid recommendation call
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub user_id: i64,
    pub movie_title: String,
    pub count: usize,
    pub weights: Weights,
}

impl RecommendationRequest {
    pub fn new(user_id: i64, movie_title: impl Into<String>, count: usize) -> Self {
        Self {
            user_id,
            movie_title: movie_title.into(),
            count,
            weights: Weights::default(),
        }
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }
}

/// Summary of what the engine was built from
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub movies: usize,
    pub dropped_records: usize,
    pub vocabulary: usize,
    pub ratings: usize,
    pub holdout_rmse: Option<f64>,
    pub relevance_filter: &'static str,
    pub built_at: DateTime<Utc>,
}

pub struct RecommendationEngine {
    index: ContentIndex,
    model: RatingModel,
    /// Distinct rated movie ids in first-seen order
    candidates: Vec<i64>,
    filter: Box<dyn ThematicRelevanceFilter>,
    candidate_multiplier: usize,
    stats: EngineStats,
}

impl RecommendationEngine {
    /// Normalizes the catalog, builds the content index and trains the predictor
    pub fn build<R: Rng + ?Sized>(
        catalog: Vec<RawMovie>,
        ratings: Vec<Rating>,
        config: &EngineConfig,
        rng: &mut R,
    ) -> AppResult<Self> {
        let corpus = normalizer::normalize_all(catalog);
        if corpus.movies.is_empty() {
            return Err(AppError::Catalog(
                "No complete movie records left after normalization".to_string(),
            ));
        }
        let dropped_records = corpus.dropped;

        let index =
            ContentIndex::build(corpus.movies, config.max_features, config.collision_policy)?;

        let (model, holdout_rmse) = if config.holdout_fraction > 0.0 && ratings.len() >= 2 {
            let (train, test) = predictor::train_test_split(&ratings, config.holdout_fraction, rng);
            let model = RatingModel::fit(&train, &config.svd, rng);
            let rmse = model.rmse(&test);
            (model, Some(rmse))
        } else {
            (RatingModel::fit(&ratings, &config.svd, rng), None)
        };

        let mut seen = HashSet::new();
        let candidates: Vec<i64> = ratings
            .iter()
            .map(|r| r.movie_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let filter = config.relevance_filter.build();

        let stats = EngineStats {
            movies: index.len(),
            dropped_records,
            vocabulary: index.vocabulary().len(),
            ratings: ratings.len(),
            holdout_rmse,
            relevance_filter: filter.name(),
            built_at: Utc::now(),
        };

        tracing::info!(
            movies = stats.movies,
            dropped = stats.dropped_records,
            vocabulary = stats.vocabulary,
            ratings = stats.ratings,
            holdout_rmse = ?stats.holdout_rmse,
            relevance_filter = stats.relevance_filter,
            "Recommendation engine ready"
        );

        Ok(Self {
            index,
            model,
            candidates,
            filter,
            candidate_multiplier: config.candidate_multiplier.max(1),
            stats,
        })
    }

    /// Builds the engine with ratings pulled from a [`RatingSource`]
    pub fn from_source<R: Rng + ?Sized>(
        catalog: Vec<RawMovie>,
        source: &dyn RatingSource,
        config: &EngineConfig,
        rng: &mut R,
    ) -> AppResult<Self> {
        let ratings = source.ratings()?;
        tracing::info!(source = source.name(), ratings = ratings.len(), "Ratings loaded");
        Self::build(catalog, ratings, config, rng)
    }

    pub fn index(&self) -> &ContentIndex {
        &self.index
    }

    pub fn model(&self) -> &RatingModel {
        &self.model
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Titles of the `n` movies most similar to `title`
    pub fn recommend_content_based(&self, title: &str, n: usize) -> AppResult<Vec<String>> {
        Ok(self
            .index
            .recommend_content_based(title, n)?
            .into_iter()
            .map(|movie| movie.title.clone())
            .collect())
    }

    /// The `n` rated movie ids with the highest predicted rating for a user
    pub fn recommend_collaborative(&self, user_id: i64, n: usize) -> Vec<i64> {
        self.model.rank_top_n(user_id, &self.candidates, n)
    }

    /// Content-based and collaborative results merged into one list
    pub fn hybrid_recommend<R: Rng + ?Sized>(
        &self,
        request: &RecommendationRequest,
        rng: &mut R,
    ) -> AppResult<Vec<String>> {
        let title = request.movie_title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput(
                "movie_title parameter is required".to_string(),
            ));
        }

        let n = request.count;
        let content = self.recommend_content_based(title, n)?;

        let query = self
            .index
            .movie(title)
            .ok_or_else(|| AppError::Internal(format!("'{}' vanished from the index", title)))?;
        let query_tags = query.tag_string();

        let collab: Vec<String> = self
            .recommend_collaborative(request.user_id, n.saturating_mul(self.candidate_multiplier))
            .into_iter()
            .filter_map(|id| self.index.movie_by_id(id))
            .filter(|movie| movie.id != query.id)
            .filter(|movie| self.filter.is_relevant(&query_tags, &movie.tag_string()))
            .map(|movie| movie.title.clone())
            .collect();

        tracing::debug!(
            user_id = request.user_id,
            title = %query.title,
            content = content.len(),
            collaborative = collab.len(),
            "Merging candidate lists"
        );

        Ok(hybrid::merge(&content, collab, request.weights, n, rng))
    }

    /// Catalog titles containing `partial`
    pub fn suggestions(&self, partial: &str, limit: usize) -> Vec<String> {
        self.index.suggestions(partial, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrewMember, NamedEntry};
    use crate::services::{catalog, ratings::SimulatedRatings};
    use rand::{rngs::StdRng, SeedableRng};

    fn named(names: &[&str]) -> Option<Vec<NamedEntry>> {
        Some(
            names
                .iter()
                .map(|n| NamedEntry {
                    name: n.to_string(),
                })
                .collect(),
        )
    }

    fn raw(id: i64, title: &str, overview: &str, genres: &[&str]) -> RawMovie {
        RawMovie {
            movie_id: Some(id),
            title: Some(title.to_string()),
            overview: Some(overview.to_string()),
            genres: named(genres),
            keywords: named(&[]),
            cast: named(&[]),
            crew: Some(vec![CrewMember {
                name: format!("{} Director", title),
                job: Some("Director".to_string()),
            }]),
        }
    }

    fn small_config() -> EngineConfig {
        EngineConfig {
            svd: SvdConfig {
                factors: 8,
                ..SvdConfig::default()
            },
            ..EngineConfig::default()
        }
    }

    fn demo_engine(seed: u64) -> RecommendationEngine {
        let mut rng = StdRng::seed_from_u64(seed);
        RecommendationEngine::from_source(
            catalog::demo_catalog().unwrap(),
            &SimulatedRatings::seeded(seed),
            &small_config(),
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_build_reports_stats() {
        let engine = demo_engine(1);
        let stats = engine.stats();
        assert_eq!(stats.movies, 20);
        assert_eq!(stats.dropped_records, 0);
        assert_eq!(stats.ratings, 50);
        assert!(stats.vocabulary > 0);
        assert!(stats.holdout_rmse.unwrap().is_finite());
        assert_eq!(stats.relevance_filter, "substring");
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = RecommendationEngine::build(
            vec![RawMovie::default()],
            vec![],
            &small_config(),
            &mut rng,
        );
        assert!(matches!(result, Err(AppError::Catalog(_))));
    }

    #[test]
    fn test_hybrid_rejects_empty_title() {
        let engine = demo_engine(2);
        let mut rng = StdRng::seed_from_u64(0);
        let err = engine
            .hybrid_recommend(&RecommendationRequest::new(1, "   ", 5), &mut rng)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_hybrid_unknown_title_is_not_found() {
        let engine = demo_engine(3);
        let mut rng = StdRng::seed_from_u64(0);
        let err = engine
            .hybrid_recommend(&RecommendationRequest::new(1, "Plan 10", 5), &mut rng)
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_hybrid_bounded_unique_and_excludes_query() {
        let engine = demo_engine(4);
        let mut rng = StdRng::seed_from_u64(0);
        for n in [1, 3, 5, 10] {
            let recs = engine
                .hybrid_recommend(&RecommendationRequest::new(1, "avatar", n), &mut rng)
                .unwrap();
            assert!(recs.len() <= n);
            let unique: HashSet<&String> = recs.iter().collect();
            assert_eq!(unique.len(), recs.len());
            assert!(recs.iter().all(|t| !t.eq_ignore_ascii_case("avatar")));
        }
    }

    #[test]
    fn test_hybrid_huge_count_returns_whole_pool() {
        let engine = demo_engine(4);
        let mut rng = StdRng::seed_from_u64(0);
        let recs = engine
            .hybrid_recommend(&RecommendationRequest::new(1, "Avatar", usize::MAX), &mut rng)
            .unwrap();
        assert!(!recs.is_empty());
        assert!(recs.len() <= 19);
        assert!(!recs.contains(&"Avatar".to_string()));
    }

    #[test]
    fn test_hybrid_disjoint_avatar_titanic() {
        let catalog = vec![
            raw(1, "Avatar", "marine pandora alien", &["Science Fiction"]),
            raw(2, "Titanic", "ship iceberg romance", &["Romance"]),
        ];
        let ratings = vec![
            Rating::new(1, 1, 5),
            Rating::new(1, 2, 2),
            Rating::new(2, 2, 4),
            Rating::new(2, 1, 3),
        ];
        let mut rng = StdRng::seed_from_u64(10);
        let engine =
            RecommendationEngine::build(catalog, ratings, &small_config(), &mut rng).unwrap();

        let recs = engine
            .hybrid_recommend(&RecommendationRequest::new(1, "avatar", 5), &mut rng)
            .unwrap();
        assert!(recs.len() <= 5);
        assert!(recs.iter().all(|t| !t.eq_ignore_ascii_case("avatar")));
        assert_eq!(recs, vec!["Titanic".to_string()]);
    }

    #[test]
    fn test_tag_intersection_lets_collaborative_titles_through() {
        let config = EngineConfig {
            relevance_filter: RelevanceFilterKind::TagIntersection,
            holdout_fraction: 0.0,
            ..small_config()
        };
        let catalog = vec![
            raw(1, "Avatar", "marine pandora alien", &["Science Fiction"]),
            raw(2, "Aliens", "marine colony alien", &["Science Fiction"]),
            raw(3, "Titanic", "ship iceberg romance", &["Romance"]),
        ];
        let ratings = vec![Rating::new(1, 2, 5), Rating::new(1, 3, 4), Rating::new(1, 1, 1)];
        let mut rng = StdRng::seed_from_u64(3);
        let engine = RecommendationEngine::build(catalog, ratings, &config, &mut rng).unwrap();

        // Collaborative list only, so the filter decides everything
        let request = RecommendationRequest::new(1, "Avatar", 5).with_weights(Weights {
            content: 0.0,
            collab: 1.0,
        });
        let recs = engine.hybrid_recommend(&request, &mut rng).unwrap();
        assert_eq!(recs, vec!["Aliens".to_string()]);
    }

    #[test]
    fn test_content_path_is_deterministic() {
        let engine = demo_engine(5);
        let first = engine.recommend_content_based("Inception", 3).unwrap();
        let second = engine.recommend_content_based("Inception", 3).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert!(!first.contains(&"Inception".to_string()));
    }

    #[test]
    fn test_hybrid_reproducible_with_same_seed() {
        let engine = demo_engine(6);
        let request = RecommendationRequest::new(3, "The Dark Knight", 5);
        let a = engine
            .hybrid_recommend(&request, &mut StdRng::seed_from_u64(77))
            .unwrap();
        let b = engine
            .hybrid_recommend(&request, &mut StdRng::seed_from_u64(77))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_collaborative_candidates_come_from_ratings() {
        let engine = demo_engine(7);
        let ranked = engine.recommend_collaborative(1, 100);
        assert!(!ranked.is_empty());
        assert!(ranked.iter().all(|id| (1..=20).contains(id)));
        let unique: HashSet<&i64> = ranked.iter().collect();
        assert_eq!(unique.len(), ranked.len());
    }

    #[test]
    fn test_suggestions() {
        let engine = demo_engine(8);
        assert_eq!(engine.suggestions("TERMIN", 5), vec!["The Terminator"]);
        assert_eq!(engine.suggestions("the", 5).len(), 5);
    }
}
