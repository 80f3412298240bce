pub mod catalog;
pub mod engine;
pub mod hybrid;
pub mod normalizer;
pub mod posters;
pub mod predictor;
pub mod ratings;
pub mod similarity;
pub mod stopwords;

pub use engine::{EngineConfig, RecommendationEngine, RecommendationRequest};
pub use posters::PosterProvider;
pub use ratings::RatingSource;
