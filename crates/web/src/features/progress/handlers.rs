use axum::{
    Json,
    extract::{Path, State},
};
use storage::{Database, dto::progress::FeedbackRequest, models::ParticipantProgress};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/progress/{id}/submit",
    params(
        ("id" = Uuid, Path, description = "Progress ID")
    ),
    responses(
        (status = 200, description = "Work submitted for review", body = ParticipantProgress),
        (status = 404, description = "Progress not found"),
        (status = 409, description = "Stage is not in progress")
    ),
    tag = "progress"
)]
pub async fn submit(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParticipantProgress>, WebError> {
    let progress = services::submit(db.pool(), id).await?;

    Ok(Json(progress))
}

#[utoipa::path(
    put,
    path = "/api/progress/{id}/feedback",
    params(
        ("id" = Uuid, Path, description = "Progress ID")
    ),
    request_body = FeedbackRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Feedback stored", body = ParticipantProgress),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Progress not found")
    ),
    tag = "progress"
)]
pub async fn set_feedback(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<ParticipantProgress>, WebError> {
    req.validate()?;

    let progress = services::set_feedback(db.pool(), id, req.feedback.as_deref()).await?;

    Ok(Json(progress))
}
