//! Top-level error for the `parley` binary.

use thiserror::Error;

use crate::config::ConfigError;

/// Anything that ends a `parley` command.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Bad command line.
    #[error("{0}")]
    Usage(String),
    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An API call failed outside a chat turn.
    #[error(transparent)]
    Client(#[from] parley_client::ClientError),
    /// A turn could not start.
    #[error(transparent)]
    Session(#[from] parley_session::SessionError),
    /// Terminal I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
