#![deny(missing_docs)]
//! HTTP boundary to a hosted chat agent.
//!
//! [`AgentClient`] posts the conversation to `{base_url}/agent/{id}` with a
//! bearer key and hands back the raw response body as a [`ChunkStream`].
//! Turning those chunks into text is the job of `parley-stream`.
//!
//! ```no_run
//! use parley_client::AgentClient;
//!
//! let client = AgentClient::new("my-api-key")
//!     .base_url("https://playground.judini.ai/api/v1");
//! ```

pub mod client;
pub mod error;
pub mod payload;
pub mod transport;

pub use client::{AgentClient, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use payload::{AgentRequest, build_payload};
pub use transport::{AgentTransport, ChunkStream};
