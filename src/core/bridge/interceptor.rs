//! Upstream event inspection.

use crate::core::realtime::ServerEvent;

use super::accumulator::{DEFAULT_RESPONSE_ID, UtteranceBuffer};

/// Watches relayed upstream frames and yields finished utterances.
///
/// Frames that are not JSON, or not one of the text events, are ignored;
/// they have already been relayed downstream.
#[derive(Debug, Default)]
pub struct EventInterceptor {
    buffer: UtteranceBuffer,
}

impl EventInterceptor {
    pub fn new() -> Self {
        Self {
            buffer: UtteranceBuffer::new(),
        }
    }

    /// Inspect one upstream text frame.
    ///
    /// Returns the completed utterance when the frame finishes a response
    /// with non-blank text.
    pub fn inspect(&mut self, frame: &str) -> Option<String> {
        let event = serde_json::from_str::<ServerEvent>(frame).ok()?;

        match event {
            ServerEvent::TextDelta { response_id, delta } => {
                let id = response_id.as_deref().unwrap_or(DEFAULT_RESPONSE_ID);
                self.buffer.append(id, &delta);
                None
            }
            ServerEvent::TextDone { response_id } => {
                let id = response_id.as_deref().unwrap_or(DEFAULT_RESPONSE_ID);
                self.finish(id)
            }
            ServerEvent::ResponseDone {
                response_id,
                response,
            } => {
                let id = response_id
                    .or_else(|| response.and_then(|r| r.id))
                    .unwrap_or_else(|| DEFAULT_RESPONSE_ID.to_string());
                self.finish(&id)
            }
            ServerEvent::Other => None,
        }
    }

    fn finish(&mut self, response_id: &str) -> Option<String> {
        let text = self.buffer.complete(response_id);
        if let Some(ref text) = text {
            tracing::debug!(response_id, chars = text.len(), "Utterance complete");
        }
        text
    }

    /// Responses still accumulating.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
