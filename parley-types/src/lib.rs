#![deny(missing_docs)]
//! Conversation types shared by the parley crates.
//!
//! Providers, the stream assembler and the session layer all speak in terms
//! of [`Message`] and [`ConversationHistory`]. Nothing here performs I/O.

pub mod history;
pub mod types;

pub use history::ConversationHistory;
pub use types::{AgentInfo, MemoryMode, Message, Role};
