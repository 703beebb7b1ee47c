use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::stage::{CreateStageRequest, StageResponse, UpdateStageRequest},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/stages",
    responses(
        (status = 200, description = "Stages in competition order", body = Vec<StageResponse>)
    ),
    tag = "stages"
)]
pub async fn list_stages(State(db): State<Database>) -> Result<Json<Vec<StageResponse>>, WebError> {
    let stages = services::list_stages(db.pool()).await?;

    Ok(Json(stages.into_iter().map(StageResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/stages",
    request_body = CreateStageRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Stage appended", body = StageResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Stage order does not continue the sequence")
    ),
    tag = "stages"
)]
pub async fn create_stage(
    State(db): State<Database>,
    Json(req): Json<CreateStageRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    req.validate_dates()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let stage = services::create_stage(db.pool(), &req).await?;

    Ok((StatusCode::CREATED, Json(StageResponse::from(stage))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/stages/{id}",
    params(
        ("id" = Uuid, Path, description = "Stage ID")
    ),
    request_body = UpdateStageRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Stage updated", body = StageResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Stage not found")
    ),
    tag = "stages"
)]
pub async fn update_stage(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStageRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let existing = services::get_stage(db.pool(), id).await?;
    req.validate_dates(&existing)
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let updated = services::update_stage(db.pool(), &existing, &req).await?;

    Ok(Json(StageResponse::from(updated)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/stages/{id}",
    params(
        ("id" = Uuid, Path, description = "Stage ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Stage deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Stage not found"),
        (status = 409, description = "Stage is not last or has progress")
    ),
    tag = "stages"
)]
pub async fn delete_stage(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    services::delete_stage(db.pool(), id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
