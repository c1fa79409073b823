//! Bounded per-session conversation history.

use std::collections::VecDeque;

use crate::models::{Message, Role};

/// Default number of retained messages per session.
pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// FIFO-bounded list of user and assistant messages.
///
/// Holds at most `capacity` entries; pushing beyond that evicts the oldest.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: VecDeque<Message>,
    capacity: usize,
}

impl ConversationHistory {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Append one message. System messages are not part of the history and
    /// are ignored.
    pub fn push(&mut self, message: Message) {
        if message.role == Role::System {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_first_entry_evicts_oldest() {
        let mut h = ConversationHistory::new(20);
        for i in 0..20 {
            h.push_user(format!("m{i}"));
        }
        assert_eq!(h.len(), 20);
        h.push_assistant("m20");
        assert_eq!(h.len(), 20);
        let first = h.iter().next().unwrap();
        assert_eq!(first.content, "m1");
        let last = h.iter().last().unwrap();
        assert_eq!(last.content, "m20");
        assert_eq!(last.role, Role::Assistant);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut h = ConversationHistory::new(3);
        for i in 0..50 {
            h.push_user(format!("{i}"));
            assert!(h.len() <= 3);
        }
    }

    #[test]
    fn system_messages_ignored() {
        let mut h = ConversationHistory::default();
        h.push(Message::system("persona"));
        assert!(h.is_empty());
        assert_eq!(h.capacity(), DEFAULT_MAX_MESSAGES);
    }

    #[test]
    fn zero_capacity_raised_to_one() {
        let mut h = ConversationHistory::new(0);
        h.push_user("a");
        h.push_user("b");
        assert_eq!(h.len(), 1);
        assert_eq!(h.iter().next().unwrap().content, "b");
    }
}
