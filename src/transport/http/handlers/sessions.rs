use crate::transport::http::handlers::common::{error_response, ok_response};
use crate::transport::http::types::{json_422, AppState, StartSessionRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/didit/session",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Vendor session created", body = ProgressView),
        (status = 400, description = "Bad request", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 502, description = "Verification provider failed", body = ApiResponse)
    )
)]
pub async fn start_session_handler(
    State(state): State<AppState>,
    request: Result<Json<StartSessionRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"user_id\": \"...\"}").into_response(),
    };

    match state
        .verification
        .start_session(&request.user_id, request.callback_url)
        .await
    {
        Ok(view) => ok_response(StatusCode::CREATED, &view),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/didit/session/{session_id}",
    params(("session_id" = String, Path, description = "Vendor session id")),
    responses(
        (status = 200, description = "Stored session progress", body = ProgressView),
        (status = 404, description = "Unknown session", body = ApiResponse)
    )
)]
pub async fn session_status_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.verification.session_view(&session_id).await {
        Ok(view) => ok_response(StatusCode::OK, &view),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/didit/session/{session_id}/refresh",
    params(("session_id" = String, Path, description = "Vendor session id")),
    responses(
        (status = 200, description = "Progress after polling the vendor", body = ProgressView),
        (status = 404, description = "Unknown session", body = ApiResponse),
        (status = 422, description = "Vendor reported an unknown status", body = ApiResponse),
        (status = 502, description = "Verification provider failed", body = ApiResponse)
    )
)]
pub async fn refresh_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.verification.refresh_session(&session_id).await {
        Ok(view) => ok_response(StatusCode::OK, &view),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/didit/users/{user_id}/status",
    params(("user_id" = String, Path, description = "Platform user id")),
    responses(
        (status = 200, description = "Progress of the user's latest session", body = ProgressView)
    )
)]
pub async fn user_status_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.verification.user_status(&user_id).await {
        Ok(view) => ok_response(StatusCode::OK, &view),
        Err(e) => error_response(e),
    }
}
