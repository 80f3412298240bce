//! Collaborative rating predictor
//!
//! Biased matrix factorization trained with stochastic gradient descent:
//!
//! ```text
//! r̂(u, i) = μ + b_u + b_i + p_u · q_i
//! ```
//!
//! Terms for unknown users or items drop out, so any (user, movie) pair gets
//! a finite estimate. Retraining requires a full refit.

use ndarray::{Array1, Array2};
use rand::{seq::SliceRandom, Rng};
use std::collections::HashMap;

use crate::models::{Rating, MAX_RATING, MIN_RATING};

/// Training hyperparameters
#[derive(Debug, Clone)]
pub struct SvdConfig {
    /// Embedding dimension
    pub factors: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// L2 penalty on biases and factors
    pub regularization: f64,
    /// Factors start uniform in `(-init_range, init_range)`
    pub init_range: f64,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            factors: 100,
            epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
            init_range: 0.1,
        }
    }
}

/// Trained latent-factor state
#[derive(Debug, Clone)]
pub struct RatingModel {
    global_mean: f64,
    user_index: HashMap<i64, usize>,
    item_index: HashMap<i64, usize>,
    user_bias: Array1<f64>,
    item_bias: Array1<f64>,
    user_factors: Array2<f64>,
    item_factors: Array2<f64>,
}

/// Assigns dense indices to ids in first-seen order
fn index_ids(ids: impl Iterator<Item = i64>) -> HashMap<i64, usize> {
    let mut index = HashMap::new();
    for id in ids {
        let next = index.len();
        index.entry(id).or_insert(next);
    }
    index
}

fn random_factors<R: Rng + ?Sized>(rng: &mut R, rows: usize, cols: usize, range: f64) -> Array2<f64> {
    let mut factors = Array2::<f64>::zeros((rows, cols));
    if range > 0.0 {
        factors.mapv_inplace(|_| rng.gen_range(-range..range));
    }
    factors
}

impl RatingModel {
    /// Fits the model on the full rating set
    pub fn fit<R: Rng + ?Sized>(ratings: &[Rating], config: &SvdConfig, rng: &mut R) -> Self {
        let user_index = index_ids(ratings.iter().map(|r| r.user_id));
        let item_index = index_ids(ratings.iter().map(|r| r.movie_id));
        let k = config.factors;

        let global_mean = if ratings.is_empty() {
            (MIN_RATING as f64 + MAX_RATING as f64) / 2.0
        } else {
            ratings.iter().map(|r| r.value as f64).sum::<f64>() / ratings.len() as f64
        };

        let mut model = Self {
            global_mean,
            user_bias: Array1::zeros(user_index.len()),
            item_bias: Array1::zeros(item_index.len()),
            user_factors: random_factors(rng, user_index.len(), k, config.init_range),
            item_factors: random_factors(rng, item_index.len(), k, config.init_range),
            user_index,
            item_index,
        };

        let lr = config.learning_rate;
        let reg = config.regularization;

        for epoch in 0..config.epochs {
            for rating in ratings {
                let u = model.user_index[&rating.user_id];
                let i = model.item_index[&rating.movie_id];

                let dot = model.user_factors.row(u).dot(&model.item_factors.row(i));
                let err = rating.value as f64
                    - (model.global_mean + model.user_bias[u] + model.item_bias[i] + dot);

                model.user_bias[u] += lr * (err - reg * model.user_bias[u]);
                model.item_bias[i] += lr * (err - reg * model.item_bias[i]);

                for f in 0..k {
                    let puf = model.user_factors[[u, f]];
                    let qif = model.item_factors[[i, f]];
                    model.user_factors[[u, f]] += lr * (err * qif - reg * puf);
                    model.item_factors[[i, f]] += lr * (err * puf - reg * qif);
                }
            }

            if epoch % 5 == 0 {
                tracing::debug!(
                    epoch,
                    train_rmse = model.rmse(ratings),
                    "SVD training epoch"
                );
            }
        }

        model
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn knows_user(&self, user_id: i64) -> bool {
        self.user_index.contains_key(&user_id)
    }

    pub fn knows_movie(&self, movie_id: i64) -> bool {
        self.item_index.contains_key(&movie_id)
    }

    /// Estimated rating, clipped to the rating scale
    pub fn predict(&self, user_id: i64, movie_id: i64) -> f64 {
        let user = self.user_index.get(&user_id).copied();
        let item = self.item_index.get(&movie_id).copied();

        let mut estimate = self.global_mean;
        if let Some(u) = user {
            estimate += self.user_bias[u];
        }
        if let Some(i) = item {
            estimate += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (user, item) {
            estimate += self.user_factors.row(u).dot(&self.item_factors.row(i));
        }

        if !estimate.is_finite() {
            return self.global_mean;
        }
        estimate.clamp(MIN_RATING as f64, MAX_RATING as f64)
    }

    /// Top `n` candidates by estimated rating; equal estimates keep input order
    pub fn rank_top_n(&self, user_id: i64, candidates: &[i64], n: usize) -> Vec<i64> {
        let mut scored: Vec<(i64, f64)> = candidates
            .iter()
            .map(|&movie_id| (movie_id, self.predict(user_id, movie_id)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.into_iter().take(n).map(|(id, _)| id).collect()
    }

    /// Root mean squared error over a rating set; 0 for an empty set
    pub fn rmse(&self, ratings: &[Rating]) -> f64 {
        if ratings.is_empty() {
            return 0.0;
        }
        let sum: f64 = ratings
            .iter()
            .map(|r| (r.value as f64 - self.predict(r.user_id, r.movie_id)).powi(2))
            .sum();
        (sum / ratings.len() as f64).sqrt()
    }
}

/// Shuffles and splits ratings into `(train, test)`
pub fn train_test_split<R: Rng + ?Sized>(
    ratings: &[Rating],
    test_fraction: f64,
    rng: &mut R,
) -> (Vec<Rating>, Vec<Rating>) {
    let mut shuffled = ratings.to_vec();
    shuffled.shuffle(rng);

    let fraction = test_fraction.clamp(0.0, 1.0);
    let test_len = (ratings.len() as f64 * fraction).ceil() as usize;
    let test = shuffled.split_off(shuffled.len() - test_len.min(shuffled.len()));
    (shuffled, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn ratings() -> Vec<Rating> {
        vec![
            Rating::new(1, 10, 5),
            Rating::new(1, 11, 5),
            Rating::new(1, 12, 1),
            Rating::new(2, 10, 5),
            Rating::new(2, 11, 4),
            Rating::new(2, 12, 1),
            Rating::new(3, 10, 1),
            Rating::new(3, 12, 5),
        ]
    }

    fn model() -> RatingModel {
        let mut rng = StdRng::seed_from_u64(11);
        let config = SvdConfig {
            epochs: 200,
            learning_rate: 0.02,
            ..SvdConfig::default()
        };
        RatingModel::fit(&ratings(), &config, &mut rng)
    }

    #[test]
    fn test_global_mean() {
        let model = model();
        assert!((model.global_mean() - 27.0 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_unknown_pair_is_finite() {
        let model = model();
        let estimate = model.predict(999, 12345);
        assert!(estimate.is_finite());
        assert!((estimate - model.global_mean()).abs() < 1e-9);
    }

    #[test]
    fn test_predict_unknown_movie_uses_user_bias() {
        let model = model();
        assert!(model.knows_user(1));
        assert!(!model.knows_movie(77));
        let estimate = model.predict(1, 77);
        assert!(estimate.is_finite());
        assert!((MIN_RATING as f64..=MAX_RATING as f64).contains(&estimate));
    }

    #[test]
    fn test_predictions_stay_on_scale() {
        let model = model();
        for user in 1..=3 {
            for movie in 10..=12 {
                let estimate = model.predict(user, movie);
                assert!((1.0..=5.0).contains(&estimate));
            }
        }
    }

    #[test]
    fn test_training_fits_observed_preferences() {
        let model = model();
        assert!(model.predict(1, 10) > model.predict(1, 12));
        assert!(model.predict(3, 12) > model.predict(3, 10));
        assert!(model.rmse(&ratings()) < 1.0);
    }

    #[test]
    fn test_empty_training_set_uses_scale_midpoint() {
        let mut rng = StdRng::seed_from_u64(0);
        let model = RatingModel::fit(&[], &SvdConfig::default(), &mut rng);
        assert_eq!(model.predict(1, 1), 3.0);
        assert_eq!(model.rmse(&[]), 0.0);
    }

    #[test]
    fn test_fit_is_reproducible_with_seed() {
        let config = SvdConfig::default();
        let a = RatingModel::fit(&ratings(), &config, &mut StdRng::seed_from_u64(5));
        let b = RatingModel::fit(&ratings(), &config, &mut StdRng::seed_from_u64(5));
        assert_eq!(a.predict(2, 12), b.predict(2, 12));
    }

    #[test]
    fn test_rank_top_n_orders_by_estimate() {
        let model = model();
        let ranked = model.rank_top_n(1, &[12, 10, 11], 2);
        assert_eq!(ranked.len(), 2);
        assert!(!ranked.contains(&12));
    }

    #[test]
    fn test_rank_top_n_ties_keep_input_order() {
        let model = model();
        // Unknown movies all collapse to the same estimate for an unknown user
        let ranked = model.rank_top_n(42, &[300, 100, 200], 3);
        assert_eq!(ranked, vec![300, 100, 200]);
    }

    #[test]
    fn test_train_test_split_sizes() {
        let mut rng = StdRng::seed_from_u64(9);
        let all: Vec<Rating> = (0..50).map(|i| Rating::new(i, i, 3)).collect();
        let (train, test) = train_test_split(&all, 0.2, &mut rng);
        assert_eq!(train.len(), 40);
        assert_eq!(test.len(), 10);

        let (train, test) = train_test_split(&all, 0.0, &mut rng);
        assert_eq!(train.len(), 50);
        assert!(test.is_empty());
    }
}
