//! Wire-level conversation types.
//!
//! These serialize exactly as the agent API expects them:
//! `{"role": "user", "content": "..."}`.

use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the person chatting.
    User,
    /// Message produced by the remote agent.
    Assistant,
}

impl Role {
    /// The lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation message.
///
/// Fields are private so a message cannot change after it has been appended
/// to a [`ConversationHistory`](crate::ConversationHistory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Who wrote the message.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The message text.
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Whether the whole history or only the latest message goes upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMode {
    /// Send every message of the conversation, oldest first.
    #[default]
    Full,
    /// Send only the most recently appended message.
    LatestOnly,
}

impl MemoryMode {
    /// Map the `memory on/off` toggle to a mode.
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            MemoryMode::Full
        } else {
            MemoryMode::LatestOnly
        }
    }

    /// Whether the full history is sent.
    pub fn is_enabled(self) -> bool {
        matches!(self, MemoryMode::Full)
    }
}

/// An agent entry as returned by the agent listing endpoint.
///
/// Only `id` and `name` are interpreted; every other field is kept in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Identifier used in the chat endpoint path.
    pub id: String,
    /// Human-readable agent name.
    #[serde(default)]
    pub name: String,
    /// Remaining fields of the listing entry.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
