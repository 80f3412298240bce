use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;

/// Most suggestions returned for one query
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    movie_title: String,
}

/// Handler for title autocomplete. An empty query matches every title, so
/// it suggests the first titles of the catalog.
pub async fn suggest(
    State(state): State<AppState>,
    Query(params): Query<SuggestionQuery>,
) -> Json<Vec<String>> {
    Json(state.engine.suggestions(&params.movie_title, MAX_SUGGESTIONS))
}
