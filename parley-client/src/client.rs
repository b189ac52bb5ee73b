//! reqwest-backed agent API client.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use parley_types::AgentInfo;
use reqwest::header::{CONTENT_TYPE, HeaderValue};

use crate::error::{ClientError, map_http_status, map_reqwest_error};
use crate::payload::AgentRequest;
use crate::transport::{AgentTransport, ChunkStream};

/// Default agent API base URL.
pub const DEFAULT_BASE_URL: &str = "https://playground.judini.ai/api/v1";

/// Default time allowed until response headers arrive.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Client for the hosted agent API.
///
/// Every request carries `Authorization: Bearer <api_key>`. There is no
/// token refresh; the key is static for the client's lifetime.
#[derive(Clone)]
pub struct AgentClient {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) client: reqwest::Client,
}

impl AgentClient {
    /// Create a client for the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL. A trailing slash is ignored.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Time allowed until the response headers arrive.
    ///
    /// Streaming bodies are not bounded by this; they last as long as the
    /// agent keeps sending.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn agents_url(&self) -> String {
        format!("{}/agent", self.base_url)
    }

    /// `{base_url}/agent/{agent_id}` with the id escaped as one path segment.
    pub(crate) fn chat_url(&self, agent_id: &str) -> Result<reqwest::Url, ClientError> {
        let invalid = || ClientError::InvalidUrl(self.base_url.clone());
        let mut url = reqwest::Url::parse(&self.agents_url()).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .push(agent_id);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))
            .bearer_auth(&self.api_key)
    }

    /// List the agents available to this API key.
    ///
    /// Accepts either a bare JSON array or an object wrapping the array in
    /// a `data` field.
    pub async fn list_agents(&self) -> Result<Vec<AgentInfo>, ClientError> {
        let url = self.agents_url();
        tracing::debug!(url = %url, "listing agents");

        let response = self
            .request(reqwest::Method::GET, &url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;
        if !status.is_success() {
            return Err(map_http_status(status, &body));
        }

        let json: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(format!("agent list is not JSON: {e}")))?;
        let list = match json {
            serde_json::Value::Object(mut obj) => obj
                .remove("data")
                .ok_or_else(|| ClientError::InvalidResponse("agent list has no data".into()))?,
            other => other,
        };

        serde_json::from_value(list)
            .map_err(|e| ClientError::InvalidResponse(format!("invalid agent entry: {e}")))
    }
}

impl std::fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl AgentTransport for AgentClient {
    /// `POST {base_url}/agent/{agent_id}` and return the body as chunks.
    fn open_stream(
        &self,
        agent_id: &str,
        request: AgentRequest,
    ) -> impl Future<Output = Result<ChunkStream, ClientError>> + Send {
        let timeout = self.timeout;
        let missing_agent = agent_id.trim().is_empty();
        let body = serde_json::to_vec(&request);
        let target = self
            .chat_url(agent_id)
            .map(|url| (self.request(reqwest::Method::POST, url.as_str()), url));

        async move {
            if missing_agent {
                return Err(ClientError::MissingAgent);
            }
            let (http_request, url) = target?;
            let body = body.map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

            tracing::debug!(url = %url, messages = request.messages.len(), "opening agent stream");

            let response = tokio::time::timeout(timeout, http_request.body(body).send())
                .await
                .map_err(|_| ClientError::Timeout(timeout))?
                .map_err(|e| map_reqwest_error(e, timeout))?;

            let status = response.status();
            if !status.is_success() {
                let body_text = response.text().await.unwrap_or_default();
                return Err(map_http_status(status, &body_text));
            }

            let chunks = response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| map_reqwest_error(e, timeout)));
            Ok(Box::pin(chunks) as ChunkStream)
        }
    }
}
