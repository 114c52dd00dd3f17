use crate::app::WebhookOutcome;
use crate::transport::http::handlers::common::{error_response, ok_response};
use crate::transport::http::types::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The body is taken as raw bytes: the signature covers them exactly as sent.
#[utoipa::path(
    post,
    path = "/api/didit/webhook",
    request_body = WebhookPayload,
    params(
        ("X-Signature" = String, Header, description = "Hex HMAC-SHA256 of the raw body"),
        ("X-Timestamp" = String, Header, description = "Unix seconds when the vendor signed the body")
    ),
    responses(
        (status = 200, description = "Webhook applied (or stale and ignored)", body = ApiResponse),
        (status = 202, description = "Session unknown and unattributed; acknowledged", body = ApiResponse),
        (status = 400, description = "Malformed payload", body = ApiResponse),
        (status = 401, description = "Signature or timestamp rejected", body = ApiResponse),
        (status = 422, description = "Unknown vendor status", body = ApiResponse)
    )
)]
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let outcome = state
        .verification
        .handle_webhook(
            &body,
            header(&headers, SIGNATURE_HEADER),
            header(&headers, TIMESTAMP_HEADER),
        )
        .await;

    match outcome {
        Ok(WebhookOutcome::Applied(view)) => ok_response(
            StatusCode::OK,
            &serde_json::json!({ "applied": true, "session": view }),
        ),
        Ok(WebhookOutcome::Stale(view)) => ok_response(
            StatusCode::OK,
            &serde_json::json!({ "applied": false, "session": view }),
        ),
        Ok(WebhookOutcome::Unattributed { session_id }) => ok_response(
            StatusCode::ACCEPTED,
            &serde_json::json!({ "applied": false, "session_id": session_id }),
        ),
        Err(e) => error_response(e),
    }
}
