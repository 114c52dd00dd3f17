use crate::app::{PharmacyService, VerificationService, VerificationSettings};
use crate::infra::config::AppConfig;
use crate::infra::didit::{DiditClient, VerificationProvider};
use crate::storage::{MemoryStore, PharmacyStore, PostgresStore, VerificationStore};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub verification: Arc<VerificationService>,
    pub pharmacies: Arc<PharmacyService>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn VerificationProvider>,
        sessions: Arc<dyn VerificationStore>,
        pharmacies: Arc<dyn PharmacyStore>,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            verification: Arc::new(VerificationService::new(provider, sessions, settings)),
            pharmacies: Arc::new(PharmacyService::new(pharmacies)),
        }
    }

    /// Wires the Didit client and the store selected by `DATABASE_URL`.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let provider: Arc<dyn VerificationProvider> = Arc::new(DiditClient::new(&config.didit)?);
        let settings = VerificationSettings::from(config);

        match &config.database_url {
            Some(url) => {
                let store = Arc::new(PostgresStore::connect(url).await?);
                info!("using Postgres store");
                Ok(Self::new(provider, store.clone(), store, settings))
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
                let store = Arc::new(MemoryStore::new());
                Ok(Self::new(provider, store.clone(), store, settings))
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(data: &T) -> Self {
        Self {
            success: true,
            data: Some(serde_json::to_value(data).unwrap_or_default()),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct StartSessionRequest {
    pub user_id: String,
    /// Overrides the configured redirect for this session only.
    #[serde(default)]
    pub callback_url: Option<String>,
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::err(format!(
            "Invalid JSON body: {} (expected: {})",
            err, expected
        ))),
    )
}
