//! Transport-neutral frames and the channel halves the bridge relays between.
//!
//! The downstream side is an axum WebSocket, the upstream side a
//! tokio-tungstenite client; both are reduced to [`FrameSource`] and
//! [`FrameSink`] so the session loop does not care which is which.

use async_trait::async_trait;
use axum::extract::ws::{
    CloseFrame as AxumCloseFrame, Message as AxumMessage, Utf8Bytes as AxumUtf8Bytes, WebSocket,
};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{Message as WsMessage, Utf8Bytes};
use tokio_tungstenite::tungstenite::protocol::CloseFrame as WsCloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use super::BridgeError;
use crate::core::realtime::UpstreamSocket;

/// One relayed WebSocket data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

/// Why a channel is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The other side went away cleanly (1000)
    Normal,
    /// The other side failed (1011)
    Error,
}

impl CloseReason {
    pub fn code(self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::Error => 1011,
        }
    }
}

/// Receiving half of a relayed channel.
#[async_trait]
pub trait FrameSource: Send {
    /// Next data frame. `None` once the peer has closed.
    ///
    /// Control frames (ping, pong) are consumed here and never surfaced.
    async fn next_frame(&mut self) -> Option<Result<Frame, BridgeError>>;
}

/// Sending half of a relayed channel.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), BridgeError>;

    /// Send a close frame and shut the sink down.
    async fn close(&mut self, reason: CloseReason) -> Result<(), BridgeError>;
}

// =============================================================================
// Downstream (axum)
// =============================================================================

#[async_trait]
impl FrameSource for SplitStream<WebSocket> {
    async fn next_frame(&mut self) -> Option<Result<Frame, BridgeError>> {
        loop {
            match self.next().await? {
                Ok(AxumMessage::Text(text)) => return Some(Ok(Frame::Text(text.to_string()))),
                Ok(AxumMessage::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                Ok(AxumMessage::Close(_)) => return None,
                Ok(AxumMessage::Ping(_)) | Ok(AxumMessage::Pong(_)) => continue,
                Err(e) => return Some(Err(BridgeError::Transport(e.to_string()))),
            }
        }
    }
}

#[async_trait]
impl FrameSink for SplitSink<WebSocket, AxumMessage> {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), BridgeError> {
        let message = match frame {
            Frame::Text(text) => AxumMessage::Text(text.into()),
            Frame::Binary(data) => AxumMessage::Binary(data),
        };
        self.send(message)
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))
    }

    async fn close(&mut self, reason: CloseReason) -> Result<(), BridgeError> {
        let frame = AxumCloseFrame {
            code: reason.code(),
            reason: AxumUtf8Bytes::from_static(""),
        };
        let result = self.send(AxumMessage::Close(Some(frame))).await;
        let _ = SinkExt::close(self).await;
        result.map_err(|e| BridgeError::Transport(e.to_string()))
    }
}

// =============================================================================
// Upstream (tokio-tungstenite)
// =============================================================================

#[async_trait]
impl FrameSource for SplitStream<UpstreamSocket> {
    async fn next_frame(&mut self) -> Option<Result<Frame, BridgeError>> {
        loop {
            match self.next().await? {
                Ok(WsMessage::Text(text)) => return Some(Ok(Frame::Text(text.to_string()))),
                Ok(WsMessage::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                Ok(WsMessage::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(BridgeError::Transport(e.to_string()))),
            }
        }
    }
}

#[async_trait]
impl FrameSink for SplitSink<UpstreamSocket, WsMessage> {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), BridgeError> {
        let message = match frame {
            Frame::Text(text) => WsMessage::Text(text.into()),
            Frame::Binary(data) => WsMessage::Binary(data),
        };
        self.send(message)
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))
    }

    async fn close(&mut self, reason: CloseReason) -> Result<(), BridgeError> {
        let frame = WsCloseFrame {
            code: CloseCode::from(reason.code()),
            reason: Utf8Bytes::from_static(""),
        };
        let result = self.send(WsMessage::Close(Some(frame))).await;
        let _ = SinkExt::close(self).await;
        result.map_err(|e| BridgeError::Transport(e.to_string()))
    }
}

/// Split an upstream socket into boxed relay halves.
pub fn split_upstream(socket: UpstreamSocket) -> (Box<dyn FrameSink>, Box<dyn FrameSource>) {
    let (sink, stream) = socket.split();
    (Box::new(sink), Box::new(stream))
}

/// Split a downstream socket into boxed relay halves.
pub fn split_downstream(socket: WebSocket) -> (Box<dyn FrameSink>, Box<dyn FrameSource>) {
    let (sink, stream) = socket.split();
    (Box::new(sink), Box::new(stream))
}
