//! Upstream WebSocket connection to the OpenAI Realtime API.

use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::RealtimeError;

/// WebSocket stream to the upstream realtime endpoint.
pub type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the upstream channel for one bridge session.
///
/// `endpoint` is the full WebSocket URL including the `model` query
/// parameter. The handshake carries the bearer key, the realtime beta
/// header and the `realtime` subprotocol.
pub async fn connect(endpoint: &str, api_key: &str) -> Result<UpstreamSocket, RealtimeError> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| RealtimeError::InvalidConfiguration(format!("{endpoint}: {e}")))?;
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => {
            return Err(RealtimeError::InvalidConfiguration(format!(
                "{endpoint}: missing host"
            )));
        }
    };

    // Build request with headers
    let request = http::Request::builder()
        .uri(endpoint)
        .header("Authorization", format!("Bearer {api_key}"))
        .header("OpenAI-Beta", "realtime=v1")
        .header("Sec-WebSocket-Protocol", "realtime")
        .header(
            "Sec-WebSocket-Key",
            tungstenite::handshake::client::generate_key(),
        )
        .header("Sec-WebSocket-Version", "13")
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Host", host)
        .body(())
        .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(classify_handshake_error)?;

    tracing::info!(endpoint = %url.path(), "Connected to OpenAI Realtime API");
    Ok(ws_stream)
}

fn classify_handshake_error(err: tungstenite::Error) -> RealtimeError {
    match err {
        tungstenite::Error::Http(response)
            if matches!(response.status().as_u16(), 401 | 403) =>
        {
            RealtimeError::AuthenticationFailed(format!(
                "upstream rejected credentials with status {}",
                response.status()
            ))
        }
        tungstenite::Error::Http(response) => RealtimeError::ConnectionFailed(format!(
            "upstream handshake failed with status {}",
            response.status()
        )),
        other => RealtimeError::ConnectionFailed(other.to_string()),
    }
}
