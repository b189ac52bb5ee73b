//! Errors from the agent API and helpers mapping HTTP failures onto them.

use std::time::Duration;

use thiserror::Error;

/// Errors from agent API requests.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, DNS or body read failure.
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request did not complete in time.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// API key missing, wrong or not allowed to use the agent.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Agent or endpoint does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// A body that should have been JSON could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// No agent id was configured for a chat request.
    #[error("no agent selected")]
    MissingAgent,

    /// The base URL cannot carry an agent path.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Whether the failure happened before any HTTP status was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
    }
}

/// Map a non-success HTTP status to a [`ClientError`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ClientError {
    match status.as_u16() {
        401 | 403 => ClientError::Authentication(body.to_string()),
        404 => ClientError::NotFound(body.to_string()),
        code => ClientError::Status {
            status: code,
            body: body.to_string(),
        },
    }
}

/// Map a [`reqwest::Error`] to a [`ClientError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(timeout)
    } else {
        ClientError::Network(Box::new(err))
    }
}
