//! Persistence for verification sessions and pharmacy registrations.

use crate::domain::pharmacy::{Pharmacy, PharmacyFilter, PharmacyUpdate};
use crate::domain::verification::{SessionUpdate, VerificationSession, VerificationStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Conflict(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub(crate) const ACTIVE_REGISTRATION_CONFLICT: &str =
    "user already has an active pharmacy registration";

/// A status report for one session, from a webhook or a poll.
#[derive(Debug, Clone)]
pub struct Observation {
    pub session_id: String,
    /// Used to create the row when the session is not known locally.
    pub user_id: Option<String>,
    pub status: VerificationStatus,
    pub decision: Option<JsonValue>,
    pub observed_at: DateTime<Utc>,
}

#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// Inserts a new session. Returns `false`, leaving the stored row untouched, when a row
    /// with the same `session_id` already exists.
    async fn insert(&self, session: &VerificationSession) -> Result<bool, StoreError>;

    async fn get(&self, session_id: &str) -> Result<Option<VerificationSession>, StoreError>;

    /// Most recently created session for the user; ties go to the greatest `session_id`.
    async fn latest_for_user(&self, user_id: &str) -> Result<Option<VerificationSession>, StoreError>;

    /// Atomically applies an observation with the lifecycle ordering rule.
    ///
    /// Returns `None` when the session is unknown and the observation carries no user id.
    async fn observe(
        &self,
        observation: Observation,
    ) -> Result<Option<(VerificationSession, SessionUpdate)>, StoreError>;
}

#[async_trait]
pub trait PharmacyStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] if the owner already has an active registration.
    async fn create(&self, pharmacy: &Pharmacy) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Pharmacy>, StoreError>;

    /// Newest first.
    async fn list(&self, filter: &PharmacyFilter) -> Result<Vec<Pharmacy>, StoreError>;

    async fn update(&self, id: Uuid, update: PharmacyUpdate) -> Result<Option<Pharmacy>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Shared body of `observe` for both backends.
pub(crate) fn apply_observation(
    existing: Option<VerificationSession>,
    observation: Observation,
) -> Option<(VerificationSession, SessionUpdate)> {
    let mut session = match existing {
        Some(s) => s,
        None => VerificationSession::new(
            observation.session_id.clone(),
            observation.user_id?,
            None,
            observation.observed_at,
        ),
    };
    let update = session.observe(observation.status, observation.decision, observation.observed_at);
    Some((session, update))
}
