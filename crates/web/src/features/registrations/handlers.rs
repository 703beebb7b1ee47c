use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        common::{PaginatedResponse, PaginationParams},
        progress::ProgressionSnapshot,
        registration::{
            CreateRegistrationRequest, RegistrationFilter, RegistrationResponse,
            UpdateRegistrationStatusRequest,
        },
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/registrations",
    params(PaginationParams, RegistrationFilter),
    responses(
        (status = 200, description = "Registrations, newest first", body = PaginatedResponse<RegistrationResponse>),
        (status = 400, description = "Invalid pagination or status filter")
    ),
    tag = "registrations"
)]
pub async fn list_registrations(
    State(db): State<Database>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<RegistrationFilter>,
) -> Result<Response, WebError> {
    pagination.validate().map_err(WebError::BadRequest)?;
    let status = filter.status().map_err(WebError::BadRequest)?;

    let (registrations, total_items) =
        services::list_registrations(db.pool(), status, &pagination).await?;

    let data: Vec<RegistrationResponse> = registrations
        .into_iter()
        .map(RegistrationResponse::from)
        .collect();

    Ok(Json(PaginatedResponse::new(data, pagination, total_items)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/registrations",
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registration created as pending", body = RegistrationResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "User already registered in this category")
    ),
    tag = "registrations"
)]
pub async fn create_registration(
    State(db): State<Database>,
    Json(req): Json<CreateRegistrationRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let registration = services::create_registration(db.pool(), &req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse::from(registration)),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/registrations/{id}/progress",
    params(
        ("id" = Uuid, Path, description = "Registration ID")
    ),
    responses(
        (status = 200, description = "Registration with its stage progress", body = ProgressionSnapshot),
        (status = 404, description = "Registration not found")
    ),
    tag = "registrations"
)]
pub async fn get_progress(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgressionSnapshot>, WebError> {
    let snapshot = services::get_progress(db.pool(), id).await?;

    Ok(Json(snapshot))
}

#[utoipa::path(
    put,
    path = "/api/registrations/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Registration ID")
    ),
    request_body = UpdateRegistrationStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Decision applied; approval advances the team one stage", body = ProgressionSnapshot),
        (status = 400, description = "Status is not pending, approved or rejected"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Registration not found"),
        (status = 409, description = "Concurrent update conflict"),
        (status = 422, description = "No first stage is configured")
    ),
    tag = "registrations"
)]
pub async fn update_status(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRegistrationStatusRequest>,
) -> Result<Json<ProgressionSnapshot>, WebError> {
    req.validate()?;
    let decision = req.decision().map_err(WebError::BadRequest)?;

    let snapshot = services::decide(db.pool(), id, decision).await?;

    Ok(Json(snapshot))
}
