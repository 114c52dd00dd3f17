// In-process store. Used when no DATABASE_URL is configured, and by the tests.

use crate::domain::pharmacy::{Pharmacy, PharmacyFilter, PharmacyUpdate};
use crate::domain::verification::{SessionUpdate, VerificationSession};
use crate::storage::{
    apply_observation, Observation, PharmacyStore, StoreError, VerificationStore,
    ACTIVE_REGISTRATION_CONFLICT,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, VerificationSession>>,
    pharmacies: RwLock<HashMap<Uuid, Pharmacy>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn has_other_active(pharmacies: &HashMap<Uuid, Pharmacy>, candidate: &Pharmacy) -> bool {
    candidate.status.is_active()
        && pharmacies.values().any(|p| {
            p.id != candidate.id && p.owner_user_id == candidate.owner_user_id && p.status.is_active()
        })
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, session: &VerificationSession) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.session_id) {
            return Ok(false);
        }
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(true)
    }

    async fn get(&self, session_id: &str) -> Result<Option<VerificationSession>, StoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn latest_for_user(&self, user_id: &str) -> Result<Option<VerificationSession>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.session_id.cmp(&b.session_id))
            })
            .cloned())
    }

    async fn observe(
        &self,
        observation: Observation,
    ) -> Result<Option<(VerificationSession, SessionUpdate)>, StoreError> {
        let mut sessions = self.sessions.write().await;
        let existing = sessions.get(&observation.session_id).cloned();
        let Some((session, update)) = apply_observation(existing, observation) else {
            return Ok(None);
        };
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(Some((session, update)))
    }
}

#[async_trait]
impl PharmacyStore for MemoryStore {
    async fn create(&self, pharmacy: &Pharmacy) -> Result<(), StoreError> {
        let mut pharmacies = self.pharmacies.write().await;
        if has_other_active(&pharmacies, pharmacy) {
            return Err(StoreError::Conflict(ACTIVE_REGISTRATION_CONFLICT.to_string()));
        }
        pharmacies.insert(pharmacy.id, pharmacy.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Pharmacy>, StoreError> {
        Ok(self.pharmacies.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &PharmacyFilter) -> Result<Vec<Pharmacy>, StoreError> {
        let mut out: Vec<Pharmacy> = self
            .pharmacies
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn update(&self, id: Uuid, update: PharmacyUpdate) -> Result<Option<Pharmacy>, StoreError> {
        let mut pharmacies = self.pharmacies.write().await;
        let Some(mut pharmacy) = pharmacies.get(&id).cloned() else {
            return Ok(None);
        };
        update.apply(&mut pharmacy, Utc::now());
        if has_other_active(&pharmacies, &pharmacy) {
            return Err(StoreError::Conflict(ACTIVE_REGISTRATION_CONFLICT.to_string()));
        }
        pharmacies.insert(id, pharmacy.clone());
        Ok(Some(pharmacy))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.pharmacies.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verification::VerificationStatus;

    #[tokio::test]
    async fn latest_for_user_breaks_created_at_ties_by_session_id() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for id in ["sess-b", "sess-c", "sess-a"] {
            let session = VerificationSession::new(id.to_string(), "user-1".to_string(), None, now);
            assert!(store.insert(&session).await.unwrap());
        }
        let latest = store.latest_for_user("user-1").await.unwrap().unwrap();
        assert_eq!(latest.session_id, "sess-c");
    }

    #[tokio::test]
    async fn insert_does_not_overwrite_an_observed_session() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .observe(Observation {
                session_id: "sess-1".to_string(),
                user_id: Some("user-1".to_string()),
                status: VerificationStatus::Approved,
                decision: None,
                observed_at: now,
            })
            .await
            .unwrap();

        let fresh = VerificationSession::new("sess-1".to_string(), "user-1".to_string(), None, now);
        assert!(!store.insert(&fresh).await.unwrap());
        let stored = VerificationStore::get(&store, "sess-1").await.unwrap().unwrap();
        assert_eq!(stored.status, VerificationStatus::Approved);
    }
}
