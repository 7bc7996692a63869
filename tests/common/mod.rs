//! Shared fixtures: a scripted upstream realtime server and an in-process
//! bridge server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use http::HeaderValue;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, accept_hdr_async, connect_async};

use voice_bridge::{ServerConfig, routes, state::AppState};

pub type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What the mock upstream observed from the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Text(String),
    Binary(Vec<u8>),
    Closed,
}

/// Commands the test sends through the mock upstream.
#[derive(Debug)]
pub enum Script {
    Text(String),
    Close,
}

/// A single-connection upstream realtime server.
pub struct MockUpstream {
    pub url: String,
    pub observed: mpsc::UnboundedReceiver<Observed>,
    pub script: mpsc::UnboundedSender<Script>,
    pub authorization: oneshot::Receiver<Option<String>>,
}

impl MockUpstream {
    /// Accept one connection, optionally waiting before the handshake.
    pub async fn start(handshake_delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (observed_tx, observed) = mpsc::unbounded_channel();
        let (script, mut script_rx) = mpsc::unbounded_channel();
        let (auth_tx, authorization) = oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(handshake_delay).await;

            let callback = |request: &Request, mut response: Response| {
                let auth = request
                    .headers()
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let _ = auth_tx.send(auth);
                response
                    .headers_mut()
                    .insert("sec-websocket-protocol", HeaderValue::from_static("realtime"));
                Ok::<Response, ErrorResponse>(response)
            };
            let Ok(socket) = accept_hdr_async(stream, callback).await else {
                return;
            };
            let (mut write, mut read) = socket.split();

            loop {
                tokio::select! {
                    incoming = read.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            let _ = observed_tx.send(Observed::Text(text.to_string()));
                        }
                        Some(Ok(Message::Binary(data))) => {
                            let _ = observed_tx.send(Observed::Binary(data.to_vec()));
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                            let _ = observed_tx.send(Observed::Closed);
                            break;
                        }
                        Some(Ok(_)) => {}
                    },
                    command = script_rx.recv() => match command {
                        Some(Script::Text(text)) => {
                            let _ = write.send(Message::Text(text.into())).await;
                        }
                        Some(Script::Close) | None => {
                            let _ = write.send(Message::Close(None)).await;
                            let _ = write.close().await;
                            let _ = observed_tx.send(Observed::Closed);
                            break;
                        }
                    },
                }
            }
        });

        Self {
            url: format!("ws://{addr}/v1/realtime"),
            observed,
            script,
            authorization,
        }
    }

    pub fn send(&self, text: &str) {
        self.script.send(Script::Text(text.to_string())).unwrap();
    }

    pub fn close(&self) {
        self.script.send(Script::Close).unwrap();
    }

    /// Next frame the bridge sent upstream.
    pub async fn next(&mut self) -> Observed {
        tokio::time::timeout(Duration::from_secs(5), self.observed.recv())
            .await
            .expect("timed out waiting for upstream frame")
            .expect("mock upstream stopped")
    }

    pub async fn next_json(&mut self) -> serde_json::Value {
        match self.next().await {
            Observed::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

/// An upstream that refuses every handshake with `status`.
pub async fn rejecting_upstream(status: u16) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let callback = move |_: &Request, _: Response| {
                let response = http::Response::builder()
                    .status(status)
                    .body(Some("rejected".to_string()))
                    .unwrap();
                Err::<Response, ErrorResponse>(response)
            };
            let _ = accept_hdr_async(stream, callback).await;
        }
    });

    format!("ws://{addr}/v1/realtime")
}

/// Base configuration pointed at `upstream_url` with synthesis disabled.
pub fn test_config(upstream_url: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config.openai_api_key = Some("test-openai-key".to_string());
    config.realtime_url = upstream_url.to_string();
    config.default_route = voice_bridge::config::DefaultRoute::Disabled;
    config.http_timeout_seconds = 5;
    config
}

/// Serve the full router on a random local port.
pub async fn start_bridge(config: ServerConfig) -> SocketAddr {
    let state = AppState::new(config).await;
    let app = routes::bridge::create_bridge_router()
        .merge(routes::api::create_api_router())
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn connect_client(addr: SocketAddr, query: &str) -> ClientSocket {
    let (socket, _) = connect_async(format!("ws://{addr}/{query}")).await.unwrap();
    socket
}

/// Next data or close message from a client socket, skipping pings.
pub async fn next_message(socket: &mut ClientSocket) -> Option<Message> {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for client message")?;
        match message {
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(message) => return Some(message),
            Err(_) => return None,
        }
    }
}

/// Wait until `server` has received `count` requests whose path starts
/// with `prefix`.
pub async fn wait_for_requests(
    server: &wiremock::MockServer,
    prefix: &str,
    count: usize,
) -> Vec<wiremock::Request> {
    for _ in 0..100 {
        let matching: Vec<_> = server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().starts_with(prefix))
            .collect();
        if matching.len() >= count {
            return matching;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("expected {count} requests to {prefix}");
}
