use axum::{Json, extract::State};
use chrono::Utc;
use storage::{Database, dto::progress::SweepReport};

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/admin/sweep",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Sweep ran (or was skipped because another was running)", body = SweepReport),
        (status = 401, description = "Unauthorized")
    ),
    tag = "admin"
)]
pub async fn run_sweep(State(db): State<Database>) -> Result<Json<SweepReport>, WebError> {
    let report = services::run_sweep(db.pool(), Utc::now().date_naive()).await?;

    Ok(Json(report))
}
