//! Per-response text accumulation.

use std::collections::HashMap;

/// Response id used when an event carries none.
pub const DEFAULT_RESPONSE_ID: &str = "default";

/// Assembles streamed text deltas into complete utterances, keyed by response id.
///
/// An entry exists only between the first delta for an id and its
/// completion. Completing an unknown id is a no-op.
#[derive(Debug, Default)]
pub struct UtteranceBuffer {
    pending: HashMap<String, String>,
}

impl UtteranceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta to the entry for `response_id`, creating it if absent.
    pub fn append(&mut self, response_id: &str, delta: &str) {
        match self.pending.get_mut(response_id) {
            Some(text) => text.push_str(delta),
            None => {
                self.pending
                    .insert(response_id.to_string(), delta.to_string());
            }
        }
    }

    /// Remove the entry for `response_id` and return its trimmed text.
    ///
    /// Returns `None` when there was no entry or the text is blank.
    pub fn complete(&mut self, response_id: &str) -> Option<String> {
        let text = self.pending.remove(response_id)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Number of responses currently accumulating.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
