//! Local broadcast WebSocket.
//!
//! Every connected listener receives `{"kind":"say","text":...}` for each
//! completed utterance of any bridge session. Anything a listener sends is
//! ignored.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::select;
use tracing::{debug, info};

use crate::state::AppState;

pub async fn listen_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_listen_socket(socket, state))
}

async fn handle_listen_socket(socket: WebSocket, state: Arc<AppState>) {
    let (listener_id, mut messages) = state.listeners.add();
    info!(listener_id = %listener_id, listeners = state.listeners.len(), "Listener connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        select! {
            message = messages.recv() => {
                let Some(message) = message else { break };
                if let Err(e) = sender.send(Message::Text(message.to_string().into())).await {
                    debug!(listener_id = %listener_id, error = %e, "Listener send failed");
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.listeners.remove(&listener_id);
    info!(listener_id = %listener_id, "Listener disconnected");
}
