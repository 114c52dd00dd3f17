use crate::app::error::ServiceError;
use crate::domain::pharmacy::{NewPharmacy, Pharmacy, PharmacyFilter, PharmacyUpdate};
use crate::storage::PharmacyStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Pharmacy registration CRUD with field validation in front of the store.
pub struct PharmacyService {
    store: Arc<dyn PharmacyStore>,
}

impl PharmacyService {
    pub fn new(store: Arc<dyn PharmacyStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, form: NewPharmacy) -> Result<Pharmacy, ServiceError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }
        let pharmacy = form.into_pharmacy(Utc::now());
        self.store.create(&pharmacy).await?;
        info!(pharmacy_id = %pharmacy.id, owner = %pharmacy.owner_user_id, "pharmacy registered");
        Ok(pharmacy)
    }

    pub async fn get(&self, id: Uuid) -> Result<Pharmacy, ServiceError> {
        self.store.get(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn list(&self, filter: &PharmacyFilter) -> Result<Vec<Pharmacy>, ServiceError> {
        Ok(self.store.list(filter).await?)
    }

    pub async fn update(&self, id: Uuid, update: PharmacyUpdate) -> Result<Pharmacy, ServiceError> {
        if update.is_empty() {
            return Err(ServiceError::InvalidRequest("update contains no fields".to_string()));
        }
        let errors = update.validate();
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }
        let pharmacy = self.store.update(id, update).await?.ok_or_else(|| not_found(id))?;
        info!(pharmacy_id = %id, status = %pharmacy.status, "pharmacy updated");
        Ok(pharmacy)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        info!(pharmacy_id = %id, "pharmacy deleted");
        Ok(())
    }
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("pharmacy '{}'", id))
}
