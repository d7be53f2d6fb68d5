//! Append-only conversation log.
//!
//! [`MessageLog`] owns every [`ConversationMessage`] of a session in
//! insertion order. Messages are never edited or removed; the only way to
//! shrink the log is an explicit [`MessageLog::clear`].
//!
//! The [`context window`](MessageLog::context_window) is derived from the
//! log on demand and never cached.

use chrono::Local;
use uuid::Uuid;

use crate::models::{ContextEntry, ConversationMessage, Role};

/// Number of trailing messages sent as history with each query.
pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<ConversationMessage>,
    next_seq: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return a copy of it.
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> ConversationMessage {
        let message = ConversationMessage {
            id: Uuid::new_v4().to_string(),
            seq: self.next_seq,
            role,
            text: text.into(),
            timestamp: Local::now().format("%H:%M").to_string(),
        };
        self.next_seq += 1;
        self.messages.push(message.clone());
        message
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> ConversationMessage {
        self.push(Role::User, text)
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) -> ConversationMessage {
        self.push(Role::Assistant, text)
    }

    pub fn push_system(&mut self, text: impl Into<String>) -> ConversationMessage {
        self.push(Role::System, text)
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The last `size` messages as `{role, content}` pairs, oldest first.
    pub fn context_window(&self, size: usize) -> Vec<ContextEntry> {
        let start = self.messages.len().saturating_sub(size);
        self.messages[start..].iter().map(ContextEntry::from).collect()
    }

    /// Drop every message. Sequence numbers keep increasing so ids from
    /// before the reset stay distinguishable.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_capped_and_keeps_order() {
        let mut log = MessageLog::new();
        for i in 0..8 {
            log.push_user(format!("q{}", i));
            log.push_assistant(format!("a{}", i));
        }
        let window = log.context_window(DEFAULT_CONTEXT_WINDOW);
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].content, "a5");
        assert_eq!(window[4].content, "a7");
        assert_eq!(window[3].role, "user");
    }

    #[test]
    fn short_log_yields_whole_log() {
        let mut log = MessageLog::new();
        log.push_system("Data successfully stored from: ./test-data");
        log.push_user("hi");
        let window = log.context_window(5);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].role, "assistant");
        assert!(MessageLog::new().context_window(5).is_empty());
    }

    #[test]
    fn sequence_and_ids_are_unique() {
        let mut log = MessageLog::new();
        let a = log.push_user("one");
        let b = log.push_user("two");
        assert_ne!(a.id, b.id);
        assert!(b.seq > a.seq);

        log.clear();
        assert!(log.is_empty());
        let c = log.push_user("three");
        assert!(c.seq > b.seq);
    }
}
