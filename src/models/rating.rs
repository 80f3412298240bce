use serde::{Deserialize, Serialize};

/// Lowest value on the rating scale
pub const MIN_RATING: u8 = 1;
/// Highest value on the rating scale
pub const MAX_RATING: u8 = 5;

/// A single user rating of a movie
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rating {
    pub user_id: i64,
    pub movie_id: i64,
    #[serde(alias = "rating")]
    pub value: u8,
}

impl Rating {
    pub fn new(user_id: i64, movie_id: i64, value: u8) -> Self {
        Self {
            user_id,
            movie_id,
            value,
        }
    }

    pub fn is_on_scale(&self) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_scale_bounds() {
        assert!(Rating::new(1, 1, 1).is_on_scale());
        assert!(Rating::new(1, 1, 5).is_on_scale());
        assert!(!Rating::new(1, 1, 0).is_on_scale());
        assert!(!Rating::new(1, 1, 6).is_on_scale());
    }

    #[test]
    fn test_rating_deserializes_legacy_column_name() {
        let rating: Rating =
            serde_json::from_str(r#"{"user_id": 3, "movie_id": 7, "rating": 4}"#).unwrap();
        assert_eq!(rating, Rating::new(3, 7, 4));
    }
}
