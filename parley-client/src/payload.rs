//! Request body for the chat endpoint.

use parley_types::{ConversationHistory, MemoryMode, Message};
use serde::{Deserialize, Serialize};

/// Body of `POST /agent/{id}`: `{"messages": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    /// Messages sent upstream, oldest first.
    pub messages: Vec<Message>,
}

/// Select the messages to send for one turn.
///
/// [`MemoryMode::Full`] sends the whole history in order;
/// [`MemoryMode::LatestOnly`] sends only the last appended message.
pub fn build_payload(history: &ConversationHistory, mode: MemoryMode) -> AgentRequest {
    let messages = match mode {
        MemoryMode::Full => history.messages().to_vec(),
        MemoryMode::LatestOnly => history.last().cloned().into_iter().collect(),
    };
    AgentRequest { messages }
}
