//! Append-only conversation history.

use crate::types::Message;

/// Ordered, append-only sequence of messages for one chat session.
///
/// There is intentionally no way to remove or reorder messages: insertion
/// order is the conversation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recently appended message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no message has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate messages in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a ConversationHistory {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn push_preserves_order() {
        let mut history = ConversationHistory::new();
        history.push(Message::user("one"));
        history.push(Message::assistant("two"));
        history.push(Message::user("three"));

        let contents: Vec<&str> = history.iter().map(Message::content).collect();
        assert_eq!(contents, ["one", "two", "three"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn last_is_most_recent() {
        let mut history = ConversationHistory::new();
        assert!(history.last().is_none());
        history.push(Message::user("q"));
        history.push(Message::assistant("a"));
        assert_eq!(history.last().map(Message::role), Some(Role::Assistant));
    }

    #[test]
    fn new_history_is_empty() {
        let history = ConversationHistory::new();
        assert!(history.is_empty());
        assert!(history.messages().is_empty());
    }
}
