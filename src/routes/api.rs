use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, tts};
use crate::state::AppState;
use std::sync::Arc;

/// Create the plain HTTP router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(api::health_check))
        .route("/tts", get(tts::tts_get).post(tts::tts_post))
        .layer(TraceLayer::new_for_http())
}
