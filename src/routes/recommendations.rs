use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::RecommendedMovie,
    services::{hybrid::Weights, posters, RecommendationRequest},
};

/// Largest `count` a single request may ask for
pub const MAX_COUNT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendBody {
    #[serde(default)]
    pub movie_title: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub content_weight: Option<f64>,
    #[serde(default)]
    pub collab_weight: Option<f64>,
}

impl RecommendBody {
    /// Validates the body and fills in defaults
    fn into_request(self, state: &AppState) -> AppResult<RecommendationRequest> {
        let title = self.movie_title.unwrap_or_default();
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "movie_title parameter is required".to_string(),
            ));
        }

        let count = self.count.unwrap_or(state.defaults.count);
        if count == 0 || count > MAX_COUNT {
            return Err(AppError::InvalidInput(format!(
                "count must be between 1 and {}, got {}",
                MAX_COUNT, count
            )));
        }

        let weights = Weights::new(
            self.content_weight.unwrap_or(state.defaults.weights.content),
            self.collab_weight.unwrap_or(state.defaults.weights.collab),
        )?;

        let user_id = self.user_id.unwrap_or(state.defaults.user_id);
        Ok(RecommendationRequest::new(user_id, title, count).with_weights(weights))
    }
}

/// Handler for the hybrid recommendation endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendBody>, JsonRejection>,
) -> AppResult<Json<Vec<RecommendedMovie>>> {
    let Json(body) = payload.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    let request = body.into_request(&state)?;

    tracing::info!(
        request_id = %request_id,
        user_id = request.user_id,
        title = %request.movie_title,
        count = request.count,
        "Recommendation requested"
    );

    let engine = state.engine.clone();
    let mut rng = state.request_rng();
    let titles = tokio::task::spawn_blocking(move || engine.hybrid_recommend(&request, &mut rng))
        .await
        .map_err(|e| AppError::Internal(format!("Recommendation task failed: {}", e)))??;

    let results =
        posters::attach_posters(state.posters.clone(), titles, state.poster_timeout).await;

    tracing::info!(
        request_id = %request_id,
        results = results.len(),
        "Recommendation served"
    );

    Ok(Json(results))
}
