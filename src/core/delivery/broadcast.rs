//! Local debug broadcast to passively subscribed listeners.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Message pushed to every listener when an utterance completes.
#[derive(Debug, Clone, Serialize)]
pub struct SayMessage<'a> {
    pub kind: &'static str,
    pub text: &'a str,
}

impl<'a> SayMessage<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { kind: "say", text }
    }
}

/// Registered listeners, keyed by connection id.
///
/// Each listener is the sending half of a channel drained by that
/// listener's WebSocket task. Broadcasts iterate a snapshot so registration
/// changes never race the fan-out.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: Mutex<HashMap<Uuid, mpsc::UnboundedSender<Arc<str>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and return its id with the receiving half.
    pub fn add(&self) -> (Uuid, mpsc::UnboundedReceiver<Arc<str>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.listeners.lock().insert(id, tx);
        debug!(listener_id = %id, "Listener registered");
        (id, rx)
    }

    pub fn remove(&self, id: &Uuid) {
        if self.listeners.lock().remove(id).is_some() {
            debug!(listener_id = %id, "Listener removed");
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Send `{kind: "say", text}` to every open listener.
    ///
    /// Listeners whose receiver is gone are skipped and pruned. Returns the
    /// number of listeners reached.
    pub fn broadcast_say(&self, text: &str) -> usize {
        let payload: Arc<str> = match serde_json::to_string(&SayMessage::new(text)) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize say message");
                return 0;
            }
        };

        let snapshot: Vec<(Uuid, mpsc::UnboundedSender<Arc<str>>)> = self
            .listeners
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, tx) in snapshot {
            if tx.send(Arc::clone(&payload)).is_ok() {
                delivered += 1;
            } else {
                closed.push(id);
            }
        }

        if !closed.is_empty() {
            let mut listeners = self.listeners.lock();
            for id in &closed {
                listeners.remove(id);
            }
        }

        debug!(recipients = delivered, pruned = closed.len(), "Broadcast say");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_all_listeners() {
        let registry = ListenerRegistry::new();
        let (_a, mut rx_a) = registry.add();
        let (_b, mut rx_b) = registry.add();

        assert_eq!(registry.broadcast_say("Hello"), 2);

        let expected = r#"{"kind":"say","text":"Hello"}"#;
        assert_eq!(rx_a.recv().await.unwrap().as_ref(), expected);
        assert_eq!(rx_b.recv().await.unwrap().as_ref(), expected);
    }

    #[test]
    fn test_closed_listeners_are_pruned() {
        let registry = ListenerRegistry::new();
        let (_open, _rx_open) = registry.add();
        let (_gone, rx_gone) = registry.add();
        drop(rx_gone);

        assert_eq!(registry.broadcast_say("hi"), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_and_empty_broadcast() {
        let registry = ListenerRegistry::new();
        let (id, _rx) = registry.add();
        registry.remove(&id);
        registry.remove(&id);

        assert!(registry.is_empty());
        assert_eq!(registry.broadcast_say("nobody"), 0);
    }

    #[test]
    fn test_text_is_json_escaped() {
        let registry = ListenerRegistry::new();
        let (_id, mut rx) = registry.add();
        registry.broadcast_say("say \"hi\"");

        let message: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(message["kind"], "say");
        assert_eq!(message["text"], "say \"hi\"");
    }
}
