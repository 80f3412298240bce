pub mod movie;
pub mod rating;

pub use movie::{
    CreditsRecord, CrewMember, Movie, MovieRecord, NamedEntry, RawMovie, RecommendedMovie,
};
pub use rating::{Rating, MAX_RATING, MIN_RATING};
