// Responsible for all communication with the Didit verification API.

use crate::infra::config::DiditConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// Vendor error bodies are truncated to this many bytes before being surfaced.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("verification provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("verification provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("verification provider returned an unexpected body: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSession {
    pub workflow_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    /// Echoed back on every webhook; we put the user id here.
    pub vendor_data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSession {
    pub session_id: String,
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Result of the decision endpoint: the status plus the whole document.
#[derive(Debug, Clone)]
pub struct SessionDecision {
    pub session_id: String,
    pub status: String,
    pub document: JsonValue,
}

/// The seam between the lifecycle service and the vendor.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    async fn create_session(&self, request: &CreateSession) -> Result<CreatedSession, ProviderError>;

    async fn session_decision(&self, session_id: &str) -> Result<SessionDecision, ProviderError>;
}

/// reqwest-backed client for the vendor's v2 session API.
#[derive(Debug, Clone)]
pub struct DiditClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DiditClient {
    pub fn new(config: &DiditConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        warn!(%status, body = %body, "verification provider rejected request");
        Err(ProviderError::Status { status, body })
    }
}

#[async_trait]
impl VerificationProvider for DiditClient {
    async fn create_session(&self, request: &CreateSession) -> Result<CreatedSession, ProviderError> {
        debug!(vendor_data = %request.vendor_data, "creating verification session");
        let response = self
            .http
            .post(self.url("/v2/session/"))
            .header("x-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let created: CreatedSession = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        if created.session_id.trim().is_empty() {
            return Err(ProviderError::InvalidResponse("empty session_id".to_string()));
        }
        Ok(created)
    }

    async fn session_decision(&self, session_id: &str) -> Result<SessionDecision, ProviderError> {
        debug!(session_id, "fetching session decision");
        let response = self
            .http
            .get(self.url(&format!("/v2/session/{}/decision/", session_id)))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let document: JsonValue = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let status = document
            .get("status")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| ProviderError::InvalidResponse("decision has no status".to_string()))?
            .to_string();
        let returned_id = document
            .get("session_id")
            .and_then(JsonValue::as_str)
            .unwrap_or(session_id)
            .to_string();

        Ok(SessionDecision {
            session_id: returned_id,
            status,
            document,
        })
    }
}
