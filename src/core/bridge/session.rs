//! One downstream client bridged to one upstream realtime session.

use std::collections::VecDeque;
use std::future::Future;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::BridgeError;
use super::frame::{CloseReason, Frame, FrameSink, FrameSource};
use super::interceptor::EventInterceptor;
use super::negotiator::{REASSERT_DELAY, SessionNegotiator};
use super::params::ConnectionParams;
use crate::core::delivery::DeliveryDispatcher;

/// Both halves of one side of the bridge.
pub type ChannelHalves = (Box<dyn FrameSink>, Box<dyn FrameSource>);

/// Lifecycle of a bridge session. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Accepted,
    UpstreamConnecting,
    UpstreamOpen,
    Closing,
    Closed,
}

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The client closed its connection
    DownstreamClosed,
    /// The upstream closed its connection
    UpstreamClosed,
    /// Either side failed, or the upstream never opened
    Failed(BridgeError),
}

impl SessionEnd {
    fn close_reason(&self) -> CloseReason {
        match self {
            Self::Failed(_) => CloseReason::Error,
            _ => CloseReason::Normal,
        }
    }
}

/// State owned by one bridge session.
///
/// Created when a downstream WebSocket is accepted and consumed by
/// [`BridgeSession::run`]. The upstream is opened exactly once, right
/// away; frames the client sends before it is open are queued and
/// replayed in order after the session configuration. When either side
/// closes or fails, the other side is closed too.
pub struct BridgeSession {
    id: Uuid,
    state: SessionState,
    params: ConnectionParams,
    negotiator: SessionNegotiator,
    interceptor: EventInterceptor,
    dispatcher: DeliveryDispatcher,
    downstream_tx: Box<dyn FrameSink>,
    downstream_rx: Box<dyn FrameSource>,
    upstream_tx: Option<Box<dyn FrameSink>>,
    upstream_rx: Option<Box<dyn FrameSource>>,
    pending: VecDeque<Frame>,
    downstream_closed: bool,
}

impl BridgeSession {
    pub fn new(
        id: Uuid,
        params: ConnectionParams,
        negotiator: SessionNegotiator,
        dispatcher: DeliveryDispatcher,
        downstream: ChannelHalves,
    ) -> Self {
        let (downstream_tx, downstream_rx) = downstream;
        Self {
            id,
            state: SessionState::Accepted,
            params,
            negotiator,
            interceptor: EventInterceptor::new(),
            dispatcher,
            downstream_tx,
            downstream_rx,
            upstream_tx: None,
            upstream_rx: None,
            pending: VecDeque::new(),
            downstream_closed: false,
        }
    }

    /// Drive the session to completion.
    ///
    /// `connect` opens the upstream; it is polled while client frames are
    /// being queued.
    pub async fn run<F>(mut self, connect: F) -> SessionEnd
    where
        F: Future<Output = Result<ChannelHalves, BridgeError>>,
    {
        info!(
            session_id = %self.id,
            sample_rate = self.params.sample_rate,
            route = self.dispatcher.route().name(),
            "Bridge session accepted"
        );

        self.transition(SessionState::UpstreamConnecting);
        let end = match self.connect_upstream(connect).await {
            Ok((tx, rx)) => {
                self.upstream_tx = Some(tx);
                self.upstream_rx = Some(rx);
                self.transition(SessionState::UpstreamOpen);
                match self.open().await {
                    Ok(()) => self.relay().await,
                    Err(e) => SessionEnd::Failed(e),
                }
            }
            Err(end) => end,
        };

        self.shutdown(&end).await;
        end
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(next > self.state, "{:?} -> {:?}", self.state, next);
        debug!(session_id = %self.id, from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }

    async fn connect_upstream<F>(&mut self, connect: F) -> Result<ChannelHalves, SessionEnd>
    where
        F: Future<Output = Result<ChannelHalves, BridgeError>>,
    {
        tokio::pin!(connect);
        loop {
            tokio::select! {
                result = &mut connect => return result.map_err(SessionEnd::Failed),
                frame = self.downstream_rx.next_frame() => match frame {
                    Some(Ok(frame)) => self.pending.push_back(frame),
                    Some(Err(e)) => return Err(SessionEnd::Failed(e)),
                    None => return Err(SessionEnd::DownstreamClosed),
                },
            }
        }
    }

    /// Send the session configuration, then flush queued client frames.
    async fn open(&mut self) -> Result<(), BridgeError> {
        let config = self
            .negotiator
            .session_update(self.params.sample_rate)
            .to_json()?;
        self.send_upstream(Frame::Text(config)).await?;

        if !self.pending.is_empty() {
            debug!(session_id = %self.id, queued = self.pending.len(), "Flushing queued client frames");
        }
        while let Some(frame) = self.pending.pop_front() {
            self.forward_upstream(frame).await?;
        }
        Ok(())
    }

    async fn relay(&mut self) -> SessionEnd {
        let mut reassertion = self.negotiator.reassertion();
        let timer = tokio::time::sleep(REASSERT_DELAY);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                frame = self.downstream_rx.next_frame() => match frame {
                    Some(Ok(frame)) => {
                        if let Err(e) = self.forward_upstream(frame).await {
                            return SessionEnd::Failed(e);
                        }
                    }
                    Some(Err(e)) => return SessionEnd::Failed(e),
                    None => return SessionEnd::DownstreamClosed,
                },
                frame = next_from(&mut self.upstream_rx) => match frame {
                    Some(Ok(frame)) => self.relay_downstream(frame).await,
                    Some(Err(e)) => return SessionEnd::Failed(e),
                    None => return SessionEnd::UpstreamClosed,
                },
                () = &mut timer, if reassertion.is_some() => {
                    if let Some(event) = reassertion.take() {
                        debug!(session_id = %self.id, "Re-asserting persona");
                        let sent = match event.to_json() {
                            Ok(json) => self.send_upstream(Frame::Text(json)).await,
                            Err(e) => Err(e.into()),
                        };
                        if let Err(e) = sent {
                            return SessionEnd::Failed(e);
                        }
                    }
                }
            }
        }
    }

    async fn forward_upstream(&mut self, frame: Frame) -> Result<(), BridgeError> {
        let frame = match frame {
            Frame::Text(text) => Frame::Text(self.negotiator.rewrite_client_frame(text)),
            binary => binary,
        };
        self.send_upstream(frame).await
    }

    async fn send_upstream(&mut self, frame: Frame) -> Result<(), BridgeError> {
        match self.upstream_tx.as_mut() {
            Some(tx) => tx.send_frame(frame).await,
            None => Err(BridgeError::Transport("upstream is not open".to_string())),
        }
    }

    /// Relay one upstream frame to the client and inspect it.
    ///
    /// Every frame gets its own send attempt and failures are only logged.
    /// A client that is really gone ends the session through its read half.
    async fn relay_downstream(&mut self, frame: Frame) {
        if let Frame::Text(ref text) = frame
            && let Some(utterance) = self.interceptor.inspect(text)
        {
            self.dispatcher.dispatch(utterance);
        }

        if let Err(e) = self.downstream_tx.send_frame(frame).await {
            debug!(session_id = %self.id, error = %e, "Downstream send failed");
        }
    }

    async fn shutdown(&mut self, end: &SessionEnd) {
        self.transition(SessionState::Closing);
        match end {
            SessionEnd::Failed(e) => warn!(session_id = %self.id, error = %e, "Bridge session failed"),
            other => info!(session_id = %self.id, reason = ?other, "Bridge session ending"),
        }

        let reason = end.close_reason();
        self.close_upstream(reason).await;
        self.close_downstream(reason).await;
        self.transition(SessionState::Closed);
    }

    async fn close_upstream(&mut self, reason: CloseReason) {
        self.upstream_rx = None;
        if let Some(mut tx) = self.upstream_tx.take()
            && let Err(e) = tx.close(reason).await
        {
            debug!(session_id = %self.id, error = %e, "Upstream already closed");
        }
    }

    async fn close_downstream(&mut self, reason: CloseReason) {
        if self.downstream_closed {
            return;
        }
        self.downstream_closed = true;
        if let Err(e) = self.downstream_tx.close(reason).await {
            debug!(session_id = %self.id, error = %e, "Downstream already closed");
        }
    }
}

async fn next_from(source: &mut Option<Box<dyn FrameSource>>) -> Option<Result<Frame, BridgeError>> {
    match source {
        Some(source) => source.next_frame().await,
        None => std::future::pending().await,
    }
}
