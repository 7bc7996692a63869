use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{bridge_handler, listen_handler};
use crate::state::AppState;
use std::sync::Arc;

/// Create the WebSocket router
///
/// - `/` bridges the client to an upstream realtime session
/// - `/listen` receives completed utterances from every session
pub fn create_bridge_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(bridge_handler))
        .route("/listen", get(listen_handler))
        .layer(TraceLayer::new_for_http())
}
