use crate::domain::pharmacy::{NewPharmacy, PharmacyFilter, PharmacyUpdate};
use crate::transport::http::handlers::common::{error_response, ok_response, path_400};
use crate::transport::http::types::{json_422, ApiResponse, AppState};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/pharmacies",
    request_body = NewPharmacy,
    responses(
        (status = 201, description = "Registration created", body = Pharmacy),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 409, description = "User already has an active registration", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_pharmacy_handler(
    State(state): State<AppState>,
    request: Result<Json<NewPharmacy>, JsonRejection>,
) -> impl IntoResponse {
    let Json(form) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(
                e,
                "{\"owner_user_id\", \"name\", \"license_number\", \"address\", \"city\"}",
            )
            .into_response()
        }
    };

    match state.pharmacies.register(form).await {
        Ok(pharmacy) => ok_response(StatusCode::CREATED, &pharmacy),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/pharmacies",
    params(
        ("owner_user_id" = Option<String>, Query, description = "Only registrations owned by this user"),
        ("status" = Option<String>, Query, description = "pending | approved | rejected")
    ),
    responses(
        (status = 200, description = "Registrations, newest first", body = [Pharmacy]),
        (status = 400, description = "Invalid query", body = ApiResponse)
    )
)]
pub async fn list_pharmacies_handler(
    State(state): State<AppState>,
    filter: Result<Query<PharmacyFilter>, QueryRejection>,
) -> impl IntoResponse {
    let Query(filter) = match filter {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                axum::Json(ApiResponse::err(format!("Invalid query: {}", e))),
            )
                .into_response()
        }
    };

    match state.pharmacies.list(&filter).await {
        Ok(list) => ok_response(StatusCode::OK, &list),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/pharmacies/{id}",
    params(("id" = Uuid, Path, description = "Registration id")),
    responses(
        (status = 200, description = "Registration", body = Pharmacy),
        (status = 404, description = "Not found", body = ApiResponse)
    )
)]
pub async fn get_pharmacy_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> impl IntoResponse {
    let Path(id) = match id {
        Ok(v) => v,
        Err(e) => return path_400(e),
    };

    match state.pharmacies.get(id).await {
        Ok(pharmacy) => ok_response(StatusCode::OK, &pharmacy),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    put,
    path = "/api/pharmacies/{id}",
    params(("id" = Uuid, Path, description = "Registration id")),
    request_body = PharmacyUpdate,
    responses(
        (status = 200, description = "Updated registration", body = Pharmacy),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 404, description = "Not found", body = ApiResponse),
        (status = 409, description = "User already has an active registration", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn update_pharmacy_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<PharmacyUpdate>, JsonRejection>,
) -> impl IntoResponse {
    let Path(id) = match id {
        Ok(v) => v,
        Err(e) => return path_400(e),
    };
    let Json(update) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "an object with the fields to change").into_response(),
    };

    match state.pharmacies.update(id, update).await {
        Ok(pharmacy) => ok_response(StatusCode::OK, &pharmacy),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/pharmacies/{id}",
    params(("id" = Uuid, Path, description = "Registration id")),
    responses(
        (status = 200, description = "Registration deleted", body = ApiResponse),
        (status = 404, description = "Not found", body = ApiResponse)
    )
)]
pub async fn delete_pharmacy_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> impl IntoResponse {
    let Path(id) = match id {
        Ok(v) => v,
        Err(e) => return path_400(e),
    };

    match state.pharmacies.delete(id).await {
        Ok(()) => ok_response(StatusCode::OK, &serde_json::json!({ "deleted": id })),
        Err(e) => error_response(e),
    }
}
