#![deny(missing_docs)]
//! Incremental assembler for streamed agent responses.
//!
//! The agent API answers with newline-delimited event lines:
//!
//! ```text
//! data: {"data":"Hel"}
//! data: {"data":"lo"}
//! [DONE]
//! ```
//!
//! Transport chunks arrive with arbitrary boundaries, so a line may span
//! several chunks and a chunk may hold several lines. [`StreamAssembler`]
//! rebuilds the lines, pulls the `data` fragment out of each JSON object and
//! concatenates the fragments into an [`AssembledResponse`]. Malformed input
//! never aborts the stream; it is reported as [`AssemblyEvent::Skipped`].
//!
//! [`assemble`] drives the same state machine over an async byte stream.

pub mod assembler;
pub mod stream;

pub use assembler::{
    AssembledResponse, AssemblyEvent, DATA_PREFIX, DONE_SENTINEL, FALLBACK_TEXT, Fragment,
    SkipReason, StreamAssembler, assemble_all,
};
pub use stream::assemble;
