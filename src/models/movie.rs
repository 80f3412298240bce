use serde::{Deserialize, Serialize};

/// A `{name}` entry as found in the genre, keyword and cast columns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedEntry {
    pub name: String,
}

/// A crew credit. Only the director is kept after normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

/// Row of the movie metadata source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MovieRecord {
    #[serde(default, alias = "id")]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<NamedEntry>>,
    #[serde(default)]
    pub keywords: Option<Vec<NamedEntry>>,
}

/// Row of the credits source, joined to [`MovieRecord`] on title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreditsRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cast: Option<Vec<NamedEntry>>,
    #[serde(default)]
    pub crew: Option<Vec<CrewMember>>,
}

/// Post-join movie row, before normalization. Any field may be missing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMovie {
    pub movie_id: Option<i64>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub genres: Option<Vec<NamedEntry>>,
    pub keywords: Option<Vec<NamedEntry>>,
    pub cast: Option<Vec<NamedEntry>>,
    pub crew: Option<Vec<CrewMember>>,
}

/// A movie as seen by the recommendation engine
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    /// Lowercased tag tokens in overview, genre, keyword, cast, director order
    pub tags: Vec<String>,
}

impl Movie {
    /// Normalized lookup key for a title
    pub fn title_key(title: &str) -> String {
        title.trim().to_lowercase()
    }

    pub fn key(&self) -> String {
        Self::title_key(&self.title)
    }

    /// Tags joined by single spaces
    pub fn tag_string(&self) -> String {
        self.tags.join(" ")
    }
}

/// One entry of a recommendation response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedMovie {
    pub title: String,
    pub poster_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_key_folds_case_and_trims() {
        assert_eq!(Movie::title_key("  The Dark Knight "), "the dark knight");
    }

    #[test]
    fn test_tag_string_joins_with_spaces() {
        let movie = Movie {
            id: 1,
            title: "Avatar".to_string(),
            tags: vec!["pandora".to_string(), "sciencefiction".to_string()],
        };
        assert_eq!(movie.tag_string(), "pandora sciencefiction");
        assert_eq!(movie.key(), "avatar");
    }

    #[test]
    fn test_movie_record_accepts_tmdb_id_alias() {
        let record: MovieRecord = serde_json::from_str(
            r#"{"id": 19995, "title": "Avatar", "overview": "x", "genres": [{"id": 28, "name": "Action"}], "keywords": []}"#,
        )
        .unwrap();
        assert_eq!(record.movie_id, Some(19995));
        assert_eq!(record.genres.unwrap()[0].name, "Action");
    }

    #[test]
    fn test_crew_member_without_job() {
        let crew: CrewMember = serde_json::from_str(r#"{"name": "Jane Doe"}"#).unwrap();
        assert_eq!(crew.job, None);
    }

    #[test]
    fn test_recommended_movie_serializes_null_poster() {
        let rec = RecommendedMovie {
            title: "Titanic".to_string(),
            poster_url: None,
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"title":"Titanic","poster_url":null}"#);
    }
}
