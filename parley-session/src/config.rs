//! Configuration for a chat session.

use std::time::Duration;

use parley_types::MemoryMode;

/// Default pause between rendered fragments.
pub const DEFAULT_PACING: Duration = Duration::from_millis(50);

/// Default number of events buffered between the stream task and the renderer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Settings for one [`ChatSession`](crate::ChatSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Agent that receives the messages. Turns fail while this is unset.
    pub agent_id: Option<String>,
    /// Whether the whole history or only the latest message is sent.
    pub memory_mode: MemoryMode,
    /// Pause before each fragment is rendered, for a typing effect.
    /// Zero disables it.
    pub pacing: Duration,
    /// Capacity of the event channel. The stream task stops reading when
    /// the renderer falls this far behind.
    pub channel_capacity: usize,
}

impl SessionConfig {
    /// Config for chatting with `agent_id`, other fields defaulted.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            ..Self::default()
        }
    }

    /// Set the memory mode.
    #[must_use]
    pub fn memory_mode(mut self, mode: MemoryMode) -> Self {
        self.memory_mode = mode;
        self
    }

    /// Set the pacing delay.
    #[must_use]
    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            agent_id: None,
            memory_mode: MemoryMode::Full,
            pacing: DEFAULT_PACING,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert!(config.agent_id.is_none());
        assert_eq!(config.memory_mode, MemoryMode::Full);
        assert_eq!(config.pacing, Duration::from_millis(50));
        assert_eq!(config.channel_capacity, 16);
    }

    #[test]
    fn builder_overrides() {
        let config = SessionConfig::new("agent-7")
            .memory_mode(MemoryMode::LatestOnly)
            .pacing(Duration::ZERO);
        assert_eq!(config.agent_id.as_deref(), Some("agent-7"));
        assert_eq!(config.memory_mode, MemoryMode::LatestOnly);
        assert!(config.pacing.is_zero());
    }
}
