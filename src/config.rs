use serde::Deserialize;

use crate::services::{
    engine::EngineConfig,
    hybrid::{RelevanceFilterKind, Weights},
    predictor::SvdConfig,
    similarity::TitleCollisionPolicy,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// JSON movie metadata file. Falls back to the embedded demo catalog when unset.
    pub movies_path: Option<String>,

    /// JSON credits file, joined to the movies on title
    pub credits_path: Option<String>,

    /// JSON ratings file. Ratings are simulated when unset.
    pub ratings_path: Option<String>,

    /// TMDB API key used for poster lookups. No posters when unset.
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix prepended to TMDB poster paths
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Upper bound on a single poster lookup
    #[serde(default = "default_poster_timeout_ms")]
    pub poster_timeout_ms: u64,

    /// Redis connection URL for the poster cache
    pub redis_url: Option<String>,

    /// Fixed seed for rating simulation, model init and result shuffling
    pub rng_seed: Option<u64>,

    /// Vocabulary size of the content index
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    #[serde(default = "default_content_weight")]
    pub content_weight: f64,

    #[serde(default = "default_collab_weight")]
    pub collab_weight: f64,

    /// Number of titles returned when a request does not say
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    #[serde(default)]
    pub relevance_filter: RelevanceFilterKind,

    #[serde(default)]
    pub title_collision_policy: TitleCollisionPolicy,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_poster_timeout_ms() -> u64 {
    3000
}

fn default_max_features() -> usize {
    5000
}

fn default_content_weight() -> f64 {
    0.6
}

fn default_collab_weight() -> f64 {
    0.4
}

fn default_recommendation_count() -> usize {
    5
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.movies_path.is_some() != self.credits_path.is_some() {
            anyhow::bail!("MOVIES_PATH and CREDITS_PATH must be set together");
        }
        if self.recommendation_count == 0 {
            anyhow::bail!("RECOMMENDATION_COUNT must be at least 1");
        }
        Weights::new(self.content_weight, self.collab_weight)
            .map_err(|e| anyhow::anyhow!("Invalid recommendation weights: {}", e))?;
        Ok(())
    }

    /// Engine settings derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_features: self.max_features,
            collision_policy: self.title_collision_policy,
            relevance_filter: self.relevance_filter,
            svd: SvdConfig::default(),
            ..EngineConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            movies_path: None,
            credits_path: None,
            ratings_path: None,
            tmdb_api_key: None,
            tmdb_api_url: default_tmdb_api_url(),
            tmdb_image_base_url: default_tmdb_image_base_url(),
            poster_timeout_ms: default_poster_timeout_ms(),
            redis_url: None,
            rng_seed: None,
            max_features: default_max_features(),
            content_weight: default_content_weight(),
            collab_weight: default_collab_weight(),
            recommendation_count: default_recommendation_count(),
            relevance_filter: RelevanceFilterKind::default(),
            title_collision_policy: TitleCollisionPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_features, 5000);
        assert_eq!(config.recommendation_count, 5);
        assert!((config.content_weight - 0.6).abs() < f64::EPSILON);
        assert!((config.collab_weight - 0.4).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_movies_path_requires_credits_path() {
        let config = Config {
            movies_path: Some("movies.json".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = Config {
            collab_weight: -1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weight_above_one_rejected() {
        let config = Config {
            content_weight: 1e12,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_env_pairs() {
        let vars = vec![
            ("PORT".to_string(), "9000".to_string()),
            ("RNG_SEED".to_string(), "42".to_string()),
            ("RELEVANCE_FILTER".to_string(), "tag_intersection".to_string()),
            ("TITLE_COLLISION_POLICY".to_string(), "reject".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.relevance_filter, RelevanceFilterKind::TagIntersection);
        assert_eq!(config.title_collision_policy, TitleCollisionPolicy::Reject);
        assert_eq!(config.tmdb_api_key, None);
    }
}
