//! Settings resolution.
//!
//! Sources, lowest precedence first: built-in defaults, the secrets file,
//! environment variables, URL query parameters, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parley_client::DEFAULT_BASE_URL;
use parley_session::SessionConfig;
use parley_types::MemoryMode;
use serde::Deserialize;
use thiserror::Error;

/// Secrets file looked up when no `--secrets` flag is given.
pub const DEFAULT_SECRETS_PATH: &str = ".parley/secrets.json";

/// Query/secrets key holding the API key.
pub const API_KEY_PARAM: &str = "codegpt_api_key";

/// Query/secrets key holding the agent id.
pub const AGENT_ID_PARAM: &str = "codegpt_agent_id";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "PARLEY_API_KEY";

/// Environment variable holding the agent id.
pub const AGENT_ID_ENV: &str = "PARLEY_AGENT_ID";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "PARLEY_BASE_URL";

/// Errors while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Secrets file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Secrets file is not valid JSON of the expected shape.
    #[error("invalid secrets file {path}: {source}")]
    Json {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// `--url` value is not a URL or query string.
    #[error("invalid url {0:?}")]
    Url(String),
}

/// Contents of the secrets file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Secrets {
    /// API key.
    #[serde(default)]
    pub codegpt_api_key: Option<String>,
    /// Agent id.
    #[serde(default)]
    pub codegpt_agent_id: Option<String>,
    /// API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Secrets {
    /// Read a secrets file.
    ///
    /// A missing file is an error only when `required`; otherwise it reads
    /// as empty.
    pub fn from_path(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                tracing::debug!(path = %path.display(), "no secrets file");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given as command-line flags. `None` leaves lower sources alone.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// `--api-key`.
    pub api_key: Option<String>,
    /// `--agent`.
    pub agent_id: Option<String>,
    /// `--base-url`.
    pub base_url: Option<String>,
    /// `--url`: a URL whose query carries `codegpt_api_key` / `codegpt_agent_id`.
    pub url: Option<String>,
    /// `--no-memory`.
    pub no_memory: bool,
    /// `--pacing-ms`.
    pub pacing_ms: Option<u64>,
}

/// Fully resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Bearer key for every request.
    pub api_key: Option<String>,
    /// Selected agent.
    pub agent_id: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Memory mode for new sessions.
    pub memory_mode: MemoryMode,
    /// Pause between rendered fragments.
    pub pacing: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            agent_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            memory_mode: MemoryMode::Full,
            pacing: parley_session::config::DEFAULT_PACING,
        }
    }
}

impl Settings {
    /// Layer every source in precedence order.
    ///
    /// `env` looks up an environment variable; pass `|k| std::env::var(k).ok()`
    /// outside tests.
    pub fn resolve(
        secrets: &Secrets,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();

        apply(&mut settings.api_key, secrets.codegpt_api_key.clone());
        apply(&mut settings.agent_id, secrets.codegpt_agent_id.clone());
        if let Some(url) = non_empty(secrets.base_url.clone()) {
            settings.base_url = url;
        }

        apply(&mut settings.api_key, env(API_KEY_ENV));
        apply(&mut settings.agent_id, env(AGENT_ID_ENV));
        if let Some(url) = non_empty(env(BASE_URL_ENV)) {
            settings.base_url = url;
        }

        if let Some(url) = &overrides.url {
            let query = QueryParams::parse(url)?;
            apply(&mut settings.api_key, query.api_key);
            apply(&mut settings.agent_id, query.agent_id);
        }

        apply(&mut settings.api_key, overrides.api_key.clone());
        apply(&mut settings.agent_id, overrides.agent_id.clone());
        if let Some(url) = non_empty(overrides.base_url.clone()) {
            settings.base_url = url;
        }
        if overrides.no_memory {
            settings.memory_mode = MemoryMode::LatestOnly;
        }
        if let Some(ms) = overrides.pacing_ms {
            settings.pacing = Duration::from_millis(ms);
        }

        Ok(settings)
    }

    /// Session config for these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            agent_id: self.agent_id.clone(),
            memory_mode: self.memory_mode,
            pacing: self.pacing,
            ..SessionConfig::default()
        }
    }
}

/// Credentials carried in a URL query.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// `codegpt_api_key`.
    pub api_key: Option<String>,
    /// `codegpt_agent_id`.
    pub agent_id: Option<String>,
}

impl QueryParams {
    /// Parse a full URL (`http://host/?codegpt_api_key=...`) or a bare query
    /// string (`codegpt_api_key=...&codegpt_agent_id=...`).
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let input = input.trim();
        let url = reqwest::Url::parse(input)
            .or_else(|_| {
                let query = input.trim_start_matches('?');
                reqwest::Url::parse(&format!("http://localhost/?{query}"))
            })
            .map_err(|_| ConfigError::Url(input.to_string()))?;

        let mut params = QueryParams::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                API_KEY_PARAM => params.api_key = non_empty(Some(value.into_owned())),
                AGENT_ID_PARAM => params.agent_id = non_empty(Some(value.into_owned())),
                _ => {}
            }
        }
        Ok(params)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn apply(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = non_empty(value) {
        *slot = Some(value);
    }
}
