//! Bridge WebSocket handler
//!
//! `GET /?sample_rate=&media_url=&bot_id=` upgrades to a WebSocket that is
//! relayed to a fresh upstream realtime session.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State, WebSocketUpgrade, ws::WebSocket},
    response::Response,
};
use tracing::info;
use uuid::Uuid;

use crate::core::bridge::{
    BridgeError, BridgeSession, ConnectionParams, open_upstream, split_downstream,
};
use crate::core::delivery::{DeliveryDispatcher, DeliveryRoute};
use crate::core::realtime::RealtimeError;
use crate::core::tts::SpeechSynthesizer;
use crate::state::AppState;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

pub async fn bridge_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let params = ConnectionParams::from_query(&query, state.config.default_sample_rate);
    let route = DeliveryRoute::resolve(
        params.media_url.as_deref(),
        params.bot_id.as_deref(),
        &state.config,
    )
    .await;

    info!(
        sample_rate = params.sample_rate,
        route = route.name(),
        "Bridge WebSocket upgrade requested"
    );

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_bridge_socket(socket, state, params, route))
}

async fn handle_bridge_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    params: ConnectionParams,
    route: DeliveryRoute,
) {
    let session_id = Uuid::new_v4();

    let dispatcher = DeliveryDispatcher::new(
        session_id.to_string(),
        route,
        state
            .config
            .broadcast_enabled
            .then(|| state.listeners.clone()),
        state
            .tts
            .clone()
            .map(|tts| tts as Arc<dyn SpeechSynthesizer>),
        state.recall.clone(),
        state.media.clone(),
    );

    let session = BridgeSession::new(
        session_id,
        params,
        state.negotiator.clone(),
        dispatcher,
        split_downstream(socket),
    );

    let endpoint = state.config.realtime_endpoint();
    let api_key = state
        .config
        .require_openai_api_key()
        .map(str::to_string)
        .map_err(|e| BridgeError::Upstream(RealtimeError::InvalidConfiguration(e.to_string())));

    let end = session
        .run(async move { open_upstream(endpoint, api_key?).await })
        .await;

    info!(session_id = %session_id, outcome = ?end, "Bridge session closed");
}
