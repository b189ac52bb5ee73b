#![deny(missing_docs)]
//! Chat session and streamed turn runner.
//!
//! A [`ChatSession`] owns everything one person's chat needs: the transport,
//! the selected agent, the memory mode and the [`ConversationHistory`].
//! [`ChatSession::send`] runs one turn. A producer task reads the agent's
//! stream and pushes assembly events through a bounded channel; the caller's
//! task renders them on a [`Presenter`] in arrival order.
//!
//! [`ConversationHistory`]: parley_types::ConversationHistory

pub mod config;
pub mod presenter;
pub mod session;

pub use config::SessionConfig;
pub use presenter::{Presenter, RenderError, TurnState};
pub use session::{ChatSession, SessionError, TurnReport};
