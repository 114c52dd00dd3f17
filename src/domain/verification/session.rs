use crate::domain::verification::VerificationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// A locally persisted vendor session (one row of `didit_verifications`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSession {
    pub session_id: String,
    pub user_id: String,
    pub status: VerificationStatus,
    /// Hosted verification page the user is sent to.
    pub url: Option<String>,
    /// Last decision document received from the vendor.
    pub decision: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What happened when a status observation was applied to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    Applied {
        from: VerificationStatus,
        to: VerificationStatus,
    },
    /// The observation was older than what is stored; the status was left alone.
    Stale {
        current: VerificationStatus,
        incoming: VerificationStatus,
    },
}

impl VerificationSession {
    pub fn new(session_id: String, user_id: String, url: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            user_id,
            status: VerificationStatus::NotStarted,
            url,
            decision: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a vendor observation. A decision document is kept even when the
    /// status itself is stale.
    pub fn observe(
        &mut self,
        incoming: VerificationStatus,
        decision: Option<JsonValue>,
        now: DateTime<Utc>,
    ) -> SessionUpdate {
        if let Some(decision) = decision {
            self.decision = Some(decision);
            self.updated_at = now;
        }

        if !self.status.can_advance_to(incoming) {
            return SessionUpdate::Stale {
                current: self.status,
                incoming,
            };
        }

        let from = self.status;
        self.status = incoming;
        self.updated_at = now;
        SessionUpdate::Applied { from, to: incoming }
    }

    pub fn view(&self) -> ProgressView {
        ProgressView::for_status(Some(self.session_id.clone()), self.status, self.url.clone())
    }
}

/// The presentation every status route returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProgressView {
    pub session_id: Option<String>,
    #[schema(value_type = String, example = "In Review")]
    pub status: VerificationStatus,
    pub label: String,
    pub progress: u8,
    pub terminal: bool,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ProgressView {
    pub fn for_status(session_id: Option<String>, status: VerificationStatus, url: Option<String>) -> Self {
        Self {
            session_id,
            status,
            label: status.label().to_string(),
            progress: status.progress(),
            terminal: status.is_terminal(),
            approved: status.is_approved(),
            url,
        }
    }

    /// A user who never opened a session has made no progress at all.
    pub fn no_session() -> Self {
        Self {
            progress: 0,
            ..Self::for_status(None, VerificationStatus::NotStarted, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> VerificationSession {
        VerificationSession::new("s-1".into(), "u-1".into(), None, Utc::now())
    }

    #[test]
    fn late_observation_keeps_status_but_records_decision() {
        let mut s = session();
        assert!(matches!(
            s.observe(VerificationStatus::Approved, None, Utc::now()),
            SessionUpdate::Applied { .. }
        ));

        let outcome = s.observe(
            VerificationStatus::InProgress,
            Some(json!({"id_verification": {"status": "Approved"}})),
            Utc::now(),
        );
        assert_eq!(
            outcome,
            SessionUpdate::Stale {
                current: VerificationStatus::Approved,
                incoming: VerificationStatus::InProgress
            }
        );
        assert_eq!(s.status, VerificationStatus::Approved);
        assert!(s.decision.is_some());
    }

    #[test]
    fn empty_view_reports_zero_progress() {
        let view = ProgressView::no_session();
        assert_eq!(view.progress, 0);
        assert_eq!(view.status, VerificationStatus::NotStarted);
        assert!(view.session_id.is_none());
    }
}
