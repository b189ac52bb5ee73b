#![deny(missing_docs)]
//! Terminal chat client for hosted agents.
//!
//! The binary resolves [`Settings`](config::Settings) from a secrets file,
//! the environment, a query-string URL and flags, then runs one of the
//! commands in [`app`]. Replies stream through a
//! [`ChatSession`](parley_session::ChatSession) onto a
//! [`TerminalPresenter`](terminal::TerminalPresenter).

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod terminal;

pub use error::ParleyError;
