use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::core::config::Settings;

const AI_RESPONSE_LIMIT: usize = 2 << 20;
const SIM_RESPONSE_LIMIT: usize = 5 << 20;

#[derive(Debug, Error)]
pub(crate) enum CollaboratorError {
    #[error("{0} base url is not configured")]
    NotConfigured(&'static str),
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream response exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("upstream response is not JSON")]
    InvalidBody,
}

#[derive(Debug)]
pub(crate) struct UpstreamResponse {
    pub(crate) status: u16,
    pub(crate) body: Value,
}

/// JSON pass-through to the AI tutoring and simulation services. Their
/// payloads are opaque here; only size and transport are policed.
#[derive(Debug, Clone)]
pub(crate) struct CollaboratorClient {
    http: Client,
    ai_base_url: String,
    ai_timeout: Duration,
    sim_base_url: String,
    sim_timeout: Duration,
}

impl CollaboratorClient {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let collaborators = settings.collaborators();
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("quizdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            ai_base_url: collaborators.ai_base_url.clone(),
            ai_timeout: Duration::from_secs(collaborators.ai_request_timeout),
            sim_base_url: collaborators.sim_base_url.clone(),
            sim_timeout: Duration::from_secs(collaborators.sim_request_timeout),
        })
    }

    pub(crate) async fn ai_chat(&self, payload: &Value) -> Result<UpstreamResponse, CollaboratorError> {
        if self.ai_base_url.is_empty() {
            return Err(CollaboratorError::NotConfigured("AI"));
        }
        let url = format!("{}/v1/chat", self.ai_base_url);
        self.forward(&url, self.ai_timeout, AI_RESPONSE_LIMIT, payload).await
    }

    /// `simulation` must already have passed [`is_valid_simulation_name`].
    pub(crate) async fn simulate(
        &self,
        simulation: &str,
        payload: &Value,
    ) -> Result<UpstreamResponse, CollaboratorError> {
        if self.sim_base_url.is_empty() {
            return Err(CollaboratorError::NotConfigured("SIM"));
        }
        let url = format!("{}/v1/sim/{simulation}", self.sim_base_url);
        self.forward(&url, self.sim_timeout, SIM_RESPONSE_LIMIT, payload).await
    }

    async fn forward(
        &self,
        url: &str,
        timeout: Duration,
        limit: usize,
        payload: &Value,
    ) -> Result<UpstreamResponse, CollaboratorError> {
        let started = std::time::Instant::now();
        let response = self.http.post(url).timeout(timeout).json(payload).send().await?;
        let status = response.status().as_u16();
        let bytes = read_capped(response, limit).await?;

        tracing::debug!(
            url,
            status,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Collaborator call finished"
        );

        let body = serde_json::from_slice(&bytes).map_err(|_| CollaboratorError::InvalidBody)?;
        Ok(UpstreamResponse { status, body })
    }
}

/// Chunked bodies carry no length up front, so the cap is enforced while
/// reading and the rest of the stream is never buffered.
async fn read_capped(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, CollaboratorError> {
    if response.content_length().is_some_and(|length| length > limit as u64) {
        return Err(CollaboratorError::TooLarge { limit });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(CollaboratorError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Simulation names become a URL path segment.
pub(crate) fn is_valid_simulation_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name.bytes().all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_')
}
