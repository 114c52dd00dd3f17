use crate::domain::pharmacy::{FieldError, NewPharmacy, Pharmacy, PharmacyStatus, PharmacyUpdate};
use crate::domain::verification::ProgressView;
use crate::domain::webhook::WebhookPayload;
use crate::transport::http::handlers::{health, pharmacies, sessions, webhook};
use crate::transport::http::types::{ApiResponse, StartSessionRequest};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        sessions::start_session_handler,
        sessions::session_status_handler,
        sessions::refresh_session_handler,
        sessions::user_status_handler,
        webhook::webhook_handler,
        pharmacies::create_pharmacy_handler,
        pharmacies::list_pharmacies_handler,
        pharmacies::get_pharmacy_handler,
        pharmacies::update_pharmacy_handler,
        pharmacies::delete_pharmacy_handler
    ),
    components(schemas(
        ApiResponse,
        StartSessionRequest,
        ProgressView,
        WebhookPayload,
        Pharmacy,
        PharmacyStatus,
        NewPharmacy,
        PharmacyUpdate,
        FieldError
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/didit/session", post(sessions::start_session_handler))
        .route("/api/didit/session/:session_id", get(sessions::session_status_handler))
        .route(
            "/api/didit/session/:session_id/refresh",
            post(sessions::refresh_session_handler),
        )
        .route("/api/didit/users/:user_id/status", get(sessions::user_status_handler))
        .route("/api/didit/webhook", post(webhook::webhook_handler))
        .route(
            "/api/pharmacies",
            post(pharmacies::create_pharmacy_handler).get(pharmacies::list_pharmacies_handler),
        )
        .route(
            "/api/pharmacies/:id",
            get(pharmacies::get_pharmacy_handler)
                .put(pharmacies::update_pharmacy_handler)
                .delete(pharmacies::delete_pharmacy_handler),
        )
        .with_state(app_state)
}
