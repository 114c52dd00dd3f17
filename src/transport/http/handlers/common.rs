use crate::app::ServiceError;
use crate::storage::StoreError;
use crate::transport::http::types::ApiResponse;
use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

pub fn ok_response<T: Serialize>(status: StatusCode, data: &T) -> Response {
    (status, Json(ApiResponse::ok(data))).into_response()
}

pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::InvalidRequest(_)
        | ServiceError::Validation(_)
        | ServiceError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        ServiceError::Signature(_) => StatusCode::UNAUTHORIZED,
        ServiceError::UnknownStatus(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Provider(e) if e.is_not_found() => StatusCode::NOT_FOUND,
        ServiceError::Provider(_) => StatusCode::BAD_GATEWAY,
        ServiceError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: ServiceError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }

    let body = match err {
        ServiceError::Validation(fields) => ApiResponse {
            success: false,
            data: Some(serde_json::json!({ "fields": fields })),
            error: Some("validation failed".to_string()),
        },
        // Storage internals stay in the logs.
        ServiceError::Store(StoreError::Database(_)) | ServiceError::Store(StoreError::Corrupt(_)) => {
            ApiResponse::err("internal storage error")
        }
        other => ApiResponse::err(other.to_string()),
    };
    (status, Json(body)).into_response()
}

pub fn path_400(err: PathRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::err(format!("Invalid path parameter: {}", err))),
    )
        .into_response()
}
