use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod recommendations;
pub mod state;
pub mod suggestions;

pub use state::{AppState, RequestDefaults};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/recommend", post(recommendations::recommend))
        .route("/suggestions", get(suggestions::suggest))
        .with_state(state)
        .layer(
            // Outermost first: the request ID must exist before the trace span is made
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

async fn welcome() -> &'static str {
    "Welcome to the Cinemix movie recommendation API"
}

/// Health check endpoint, with a summary of the loaded engine
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let stats = state.engine.stats();
    Json(json!({
        "status": "healthy",
        "movies": stats.movies,
        "ratings": stats.ratings,
        "vocabulary": stats.vocabulary,
        "built_at": stats.built_at,
    }))
}
