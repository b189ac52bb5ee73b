//! The chat session and its turn runner.

use std::sync::Arc;

use futures::StreamExt;
use parley_client::{AgentRequest, AgentTransport, build_payload};
use parley_stream::{AssembledResponse, AssemblyEvent, StreamAssembler, assemble};
use parley_types::{ConversationHistory, MemoryMode, Message};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::presenter::{Presenter, RenderError, TurnState};

/// Errors that stop a turn before anything is sent.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The message was empty or whitespace.
    #[error("message is empty")]
    EmptyInput,
    /// No agent is selected.
    #[error("no agent selected")]
    NoAgent,
}

/// What happened during one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Final text shown and appended to the history.
    pub response: String,
    /// Whether the fallback text replaced an empty response.
    pub fallback: bool,
    /// Number of fragments rendered.
    pub fragments: usize,
    /// Number of chunks or lines the assembler dropped.
    pub skipped: usize,
    /// Whether the `[DONE]` sentinel arrived.
    pub sentinel_seen: bool,
    /// Transport failure, when the request or a body read failed.
    pub transport_error: Option<String>,
    /// Whether the turn was cancelled before the stream ended.
    pub cancelled: bool,
    /// Number of render calls that failed.
    pub render_failures: usize,
}

/// Messages from the stream task to the renderer.
#[derive(Debug)]
enum TurnEvent {
    Opened,
    OpenFailed(String),
    Assembly(AssemblyEvent),
    Cancelled,
}

/// One person's chat with an agent.
///
/// Created per user session and dropped when it ends; nothing outlives it.
/// [`send`](Self::send) borrows the session mutably, so turns cannot overlap.
pub struct ChatSession<T> {
    id: Uuid,
    transport: Arc<T>,
    config: SessionConfig,
    history: ConversationHistory,
    state: TurnState,
}

impl<T: AgentTransport + 'static> ChatSession<T> {
    /// Start a session with an empty history.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport: Arc::new(transport),
            config,
            history: ConversationHistory::new(),
            state: TurnState::Idle,
        }
    }

    /// Session identifier, used in log fields.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Messages exchanged so far.
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Current settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// State of the latest turn.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// The transport used for turns.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Switch to another agent. The history is kept.
    pub fn set_agent(&mut self, agent_id: impl Into<String>) {
        self.config.agent_id = Some(agent_id.into());
    }

    /// Change what is sent upstream on the next turn.
    pub fn set_memory_mode(&mut self, mode: MemoryMode) {
        self.config.memory_mode = mode;
    }

    /// Run one turn: append `input`, stream the agent's reply onto
    /// `presenter` and append the reply.
    ///
    /// Transport failures do not fail the turn; they end it with the
    /// fallback text and are noted in the [`TurnReport`]. Cancelling
    /// `cancel` stops reading the stream and finalizes whatever arrived.
    #[tracing::instrument(name = "turn", skip_all, fields(session = %self.id))]
    pub async fn send<P: Presenter>(
        &mut self,
        input: &str,
        presenter: &mut P,
        cancel: CancellationToken,
    ) -> Result<TurnReport, SessionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let agent_id = match self.config.agent_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(SessionError::NoAgent),
        };

        self.history.push(Message::user(input));
        let request = build_payload(&self.history, self.config.memory_mode);
        tracing::info!(
            agent = %agent_id,
            messages = request.messages.len(),
            memory = self.config.memory_mode.is_enabled(),
            "turn started"
        );
        self.transition(TurnState::Requesting, presenter);

        let (tx, mut rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let producer = tokio::spawn(produce(
            Arc::clone(&self.transport),
            agent_id,
            request,
            tx,
            cancel.clone(),
        ));

        let mut report = TurnReport::default();
        let mut partial = String::new();
        let mut response: Option<AssembledResponse> = None;

        while let Some(event) = rx.recv().await {
            match event {
                TurnEvent::Opened => self.transition(TurnState::Streaming, presenter),
                TurnEvent::OpenFailed(error) => {
                    tracing::warn!(%error, "agent request failed, no stream available");
                    report.transport_error = Some(error);
                    self.transition(TurnState::Finalizing, presenter);
                }
                TurnEvent::Cancelled => {
                    tracing::info!(fragments = report.fragments, "turn cancelled");
                    report.cancelled = true;
                    break;
                }
                TurnEvent::Assembly(event) => match event {
                    AssemblyEvent::Fragment(fragment) => {
                        self.pace(&cancel).await;
                        report.fragments += 1;
                        record_render(presenter.show_partial(&fragment.assembled), &mut report);
                        partial = fragment.assembled;
                    }
                    AssemblyEvent::Sentinel => report.sentinel_seen = true,
                    AssemblyEvent::Skipped(_) => report.skipped += 1,
                    AssemblyEvent::TransportError(error) => report.transport_error = Some(error),
                    AssemblyEvent::Complete(done) => response = Some(done),
                },
            }
        }

        if let Err(e) = producer.await {
            tracing::error!(error = %e, "stream task ended abnormally");
        }

        if self.state != TurnState::Finalizing {
            self.transition(TurnState::Finalizing, presenter);
        }
        let response = match response {
            Some(done) if !report.cancelled => done,
            _ => AssembledResponse::from_text(partial),
        };
        report.fallback = response.is_fallback();
        record_render(presenter.show_final(response.text()), &mut report);

        let text = response.into_text();
        self.history.push(Message::assistant(text.clone()));
        report.response = text;
        self.transition(TurnState::Done, presenter);

        tracing::info!(
            fragments = report.fragments,
            skipped = report.skipped,
            fallback = report.fallback,
            "turn finished"
        );
        Ok(report)
    }

    fn transition<P: Presenter>(&mut self, state: TurnState, presenter: &mut P) {
        tracing::debug!(from = ?self.state, to = ?state, "turn state");
        self.state = state;
        presenter.on_state(state);
    }

    async fn pace(&self, cancel: &CancellationToken) {
        if self.config.pacing.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.config.pacing) => {}
            _ = cancel.cancelled() => {}
        }
    }
}

impl<T> std::fmt::Debug for ChatSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("messages", &self.history.len())
            .field("state", &self.state)
            .finish()
    }
}

fn record_render(result: Result<(), RenderError>, report: &mut TurnReport) {
    match result {
        Ok(()) => {}
        Err(RenderError::Nothing) => tracing::debug!("nothing to render"),
        Err(e) => {
            tracing::warn!(error = %e, "render failed");
            report.render_failures += 1;
        }
    }
}

/// Open the agent stream and forward assembly events until the stream
/// ends, the renderer goes away or `cancel` fires.
async fn produce<T: AgentTransport>(
    transport: Arc<T>,
    agent_id: String,
    request: AgentRequest,
    events: mpsc::Sender<TurnEvent>,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            let _ = events.send(TurnEvent::Cancelled).await;
            return;
        }
        result = transport.open_stream(&agent_id, request) => result,
    };

    let chunks = match opened {
        Ok(chunks) => {
            if events.send(TurnEvent::Opened).await.is_err() {
                return;
            }
            chunks
        }
        Err(e) => {
            if events.send(TurnEvent::OpenFailed(e.to_string())).await.is_err() {
                return;
            }
            // No stream: an assembler that saw nothing yields the fallback.
            for event in StreamAssembler::new().finish_events() {
                if events.send(TurnEvent::Assembly(event)).await.is_err() {
                    return;
                }
            }
            return;
        }
    };

    let mut stream = std::pin::pin!(assemble(chunks));
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = events.send(TurnEvent::Cancelled).await;
                return;
            }
            next = stream.next() => next,
        };
        let Some(event) = next else {
            return;
        };
        if events.send(TurnEvent::Assembly(event)).await.is_err() {
            return;
        }
    }
}
