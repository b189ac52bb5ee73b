//! Transport seam between a session and the agent API.
//!
//! The [`AgentTransport`] trait uses RPITIT and is intentionally not
//! object-safe; sessions are generic over it. Tests substitute an in-memory
//! transport that replays canned chunks.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

use crate::error::ClientError;
use crate::payload::AgentRequest;

/// Raw response body, one item per transport chunk.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// Something that can open a streamed chat reply.
pub trait AgentTransport: Send + Sync {
    /// Send `request` to the agent and return its response body.
    ///
    /// Errors here mean no stream is available at all (connection refused,
    /// non-success status). Errors while reading the body come through the
    /// returned stream instead.
    fn open_stream(
        &self,
        agent_id: &str,
        request: AgentRequest,
    ) -> impl Future<Output = Result<ChunkStream, ClientError>> + Send;
}
