//! The identity-verification lifecycle.
//!
//! Every entry point (session creation, polling, webhooks) funnels status changes through
//! [`VerificationStore::observe`], so the ordering rule and the progress table are applied
//! in exactly one place.

use crate::app::error::ServiceError;
use crate::crypto::{verify_signature, SignatureError};
use crate::domain::verification::{ProgressView, SessionUpdate, VerificationSession, VerificationStatus};
use crate::domain::webhook::WebhookPayload;
use crate::infra::config::AppConfig;
use crate::infra::didit::{CreateSession, VerificationProvider};
use crate::storage::{Observation, VerificationStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Settings the service needs from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct VerificationSettings {
    pub workflow_id: String,
    pub callback_url: Option<String>,
    pub webhook_secret: String,
    pub webhook_tolerance_secs: u64,
}

impl From<&AppConfig> for VerificationSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            workflow_id: config.didit.workflow_id.clone(),
            callback_url: config.didit.callback_url.clone(),
            webhook_secret: config.webhook_secret.clone(),
            webhook_tolerance_secs: config.webhook_tolerance_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Applied(ProgressView),
    /// Out-of-order delivery: the stored status was already further along.
    Stale(ProgressView),
    /// Session unknown locally and the payload does not name a user.
    Unattributed { session_id: String },
}

pub struct VerificationService {
    provider: Arc<dyn VerificationProvider>,
    store: Arc<dyn VerificationStore>,
    settings: VerificationSettings,
}

impl VerificationService {
    pub fn new(
        provider: Arc<dyn VerificationProvider>,
        store: Arc<dyn VerificationStore>,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            provider,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn VerificationStore> {
        &self.store
    }

    /// Opens a vendor session for the user and records it as `Not Started`.
    pub async fn start_session(
        &self,
        user_id: &str,
        callback_url: Option<String>,
    ) -> Result<ProgressView, ServiceError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ServiceError::InvalidRequest("user_id must not be blank".to_string()));
        }

        let request = CreateSession {
            workflow_id: self.settings.workflow_id.clone(),
            callback: callback_url.or_else(|| self.settings.callback_url.clone()),
            vendor_data: user_id.to_string(),
        };
        let created = self.provider.create_session(&request).await?;

        let now = Utc::now();
        let mut session =
            VerificationSession::new(created.session_id.clone(), user_id.to_string(), created.url, now);
        if let Some(status) = created.status.as_deref().and_then(|s| s.parse::<VerificationStatus>().ok()) {
            session.observe(status, None, now);
        }
        if !self.store.insert(&session).await? {
            // A webhook for this session arrived first; its row is further along.
            info!(session_id = %session.session_id, user_id, "verification session already recorded");
            return self.session_view(&session.session_id).await;
        }

        info!(session_id = %session.session_id, user_id, "verification session created");
        Ok(session.view())
    }

    /// Stored view of a session, without asking the vendor.
    pub async fn session_view(&self, session_id: &str) -> Result<ProgressView, ServiceError> {
        self.store
            .get(session_id)
            .await?
            .map(|s| s.view())
            .ok_or_else(|| ServiceError::NotFound(format!("session '{}'", session_id)))
    }

    /// Latest session for a user, or an empty view when the user never started one.
    pub async fn user_status(&self, user_id: &str) -> Result<ProgressView, ServiceError> {
        Ok(self
            .store
            .latest_for_user(user_id)
            .await?
            .map(|s| s.view())
            .unwrap_or_else(ProgressView::no_session))
    }

    /// Polls the vendor decision endpoint and records the result.
    pub async fn refresh_session(&self, session_id: &str) -> Result<ProgressView, ServiceError> {
        let existing = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("session '{}'", session_id)))?;

        let decision = self.provider.session_decision(session_id).await?;
        let status: VerificationStatus = decision.status.parse()?;

        let observation = Observation {
            session_id: existing.session_id.clone(),
            user_id: Some(existing.user_id.clone()),
            status,
            decision: Some(decision.document),
            observed_at: Utc::now(),
        };
        let (session, update) = self
            .store
            .observe(observation)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("session '{}'", session_id)))?;

        log_update(&session.session_id, "poll", update);
        Ok(session.view())
    }

    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
        timestamp: Option<&str>,
    ) -> Result<WebhookOutcome, ServiceError> {
        self.handle_webhook_at(body, signature, timestamp, Utc::now()).await
    }

    /// Verifies the signature over the raw body, then applies the payload.
    pub async fn handle_webhook_at(
        &self,
        body: &[u8],
        signature: Option<&str>,
        timestamp: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, ServiceError> {
        let signature = signature.ok_or(SignatureError::MissingHeader("X-Signature"))?;
        let timestamp = timestamp.ok_or(SignatureError::MissingHeader("X-Timestamp"))?;
        let now_secs = u64::try_from(now.timestamp()).unwrap_or(0);

        if let Err(e) = verify_signature(
            &self.settings.webhook_secret,
            body,
            signature,
            timestamp,
            now_secs,
            self.settings.webhook_tolerance_secs,
        ) {
            warn!(error = %e, "rejecting webhook");
            return Err(e.into());
        }

        let payload: WebhookPayload =
            serde_json::from_slice(body).map_err(|e| ServiceError::MalformedPayload(e.to_string()))?;
        if payload.session_id.trim().is_empty() {
            return Err(ServiceError::MalformedPayload("session_id is empty".to_string()));
        }
        let status: VerificationStatus = payload.status.parse()?;

        let observation = Observation {
            session_id: payload.session_id.clone(),
            user_id: payload.user_id().map(str::to_string),
            status,
            decision: payload.decision.clone(),
            observed_at: now,
        };

        match self.store.observe(observation).await? {
            Some((session, update)) => {
                log_update(&session.session_id, payload.webhook_type(), update);
                Ok(match update {
                    SessionUpdate::Applied { .. } => WebhookOutcome::Applied(session.view()),
                    SessionUpdate::Stale { .. } => WebhookOutcome::Stale(session.view()),
                })
            }
            None => {
                warn!(
                    session_id = %payload.session_id,
                    webhook_type = payload.webhook_type(),
                    "webhook for unknown session without vendor_data; ignoring"
                );
                Ok(WebhookOutcome::Unattributed {
                    session_id: payload.session_id,
                })
            }
        }
    }
}

fn log_update(session_id: &str, source: &str, update: SessionUpdate) {
    match update {
        SessionUpdate::Applied { from, to } => {
            info!(session_id, source, from = %from, to = %to, "verification status updated")
        }
        SessionUpdate::Stale { current, incoming } => {
            info!(session_id, source, current = %current, incoming = %incoming, "ignoring stale status")
        }
    }
}
