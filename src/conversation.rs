//! Conversation history and generation carry-over state
//!
//! One instance per session, mutated only by the active turn. Concurrent
//! sessions must each own their own instance.

use std::collections::VecDeque;

/// Opaque generation carry-over state
///
/// Produced by a generation backend and round-tripped back into it on the
/// next turn. The core never inspects the payload; backends store whatever
/// they need (a serialized message list, a remote session id, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationContext(serde_json::Value);

impl GenerationContext {
    /// Wrap a backend-specific payload
    #[must_use]
    pub const fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    /// Backend-side accessor for the stored payload
    #[must_use]
    pub const fn payload(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Bounded history of prior user utterances plus the backend's carry-over
pub struct ConversationState {
    history: VecDeque<String>,
    max_history: usize,
    context: Option<GenerationContext>,
}

impl ConversationState {
    /// Create an empty conversation bounded to `max_history` utterances
    #[must_use]
    pub const fn new(max_history: usize) -> Self {
        Self {
            history: VecDeque::new(),
            max_history,
            context: None,
        }
    }

    /// Append an utterance, evicting the oldest entries past capacity
    pub fn append(&mut self, utterance: impl Into<String>) {
        self.history.push_back(utterance.into());
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    /// Ordered view of the retained history, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.history.iter().cloned().collect()
    }

    /// Number of retained utterances
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether any utterances are retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Store the backend's updated carry-over state
    pub fn update_context(&mut self, context: GenerationContext) {
        self.context = Some(context);
    }

    /// The stored carry-over state; `None` before the first turn
    #[must_use]
    pub const fn context(&self) -> Option<&GenerationContext> {
        self.context.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_bounded_fifo() {
        let mut state = ConversationState::new(3);
        for i in 0..5 {
            state.append(format!("utterance {i}"));
        }

        assert_eq!(
            state.snapshot(),
            ["utterance 2", "utterance 3", "utterance 4"]
        );
    }

    #[test]
    fn snapshot_is_min_of_appended_and_capacity() {
        let mut state = ConversationState::new(10);
        state.append("one");
        state.append("two");

        assert_eq!(state.len(), 2);
        assert_eq!(state.snapshot(), ["one", "two"]);
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let mut state = ConversationState::new(0);
        state.append("dropped");
        assert!(state.is_empty());
    }

    #[test]
    fn context_starts_unset_and_round_trips() {
        let mut state = ConversationState::new(5);
        assert!(state.context().is_none());

        let ctx = GenerationContext::new(serde_json::json!({"session": 42}));
        state.update_context(ctx.clone());
        assert_eq!(state.context(), Some(&ctx));
    }
}
