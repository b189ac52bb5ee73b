//! Presentation sink for streamed turns.

use thiserror::Error;

/// Lifecycle of one chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No turn has run yet.
    Idle,
    /// Waiting for the agent to accept the request.
    Requesting,
    /// Receiving fragments.
    Streaming,
    /// Stream over; fallback and history append pending.
    Finalizing,
    /// Turn complete. A new turn may start.
    Done,
}

/// Why a render call showed nothing.
#[derive(Debug, Error)]
pub enum RenderError {
    /// There was no text to show. Not a failure.
    #[error("nothing to render")]
    Nothing,
    /// Writing to the output failed.
    #[error("render failed: {0}")]
    Failed(#[from] std::io::Error),
}

/// Receives a turn's output.
///
/// Per turn the session calls [`show_partial`](Self::show_partial) zero or
/// more times, then [`show_final`](Self::show_final) exactly once.
pub trait Presenter {
    /// Show `text` followed by a streaming cursor.
    fn show_partial(&mut self, text: &str) -> Result<(), RenderError>;

    /// Show the final `text`, without cursor.
    fn show_final(&mut self, text: &str) -> Result<(), RenderError>;

    /// Observe a turn state change.
    fn on_state(&mut self, _state: TurnState) {}
}
