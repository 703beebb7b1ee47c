use sqlx::PgPool;
use storage::{
    dto::stage::{CreateStageRequest, UpdateStageRequest},
    error::{Result, StorageError},
    models::CompetitionStage,
    repository::stage::StageRepository,
    services::StageLadder,
};
use uuid::Uuid;

/// List stages in competition order
pub async fn list_stages(pool: &PgPool) -> Result<Vec<CompetitionStage>> {
    let repo = StageRepository::new(pool);
    repo.list().await
}

pub async fn get_stage(pool: &PgPool, id: Uuid) -> Result<CompetitionStage> {
    let repo = StageRepository::new(pool);
    repo.find_by_id(id).await
}

/// Append a stage to the end of the sequence
pub async fn create_stage(pool: &PgPool, request: &CreateStageRequest) -> Result<CompetitionStage> {
    let repo = StageRepository::new(pool);
    let ladder = StageLadder::new(repo.list().await?)?;
    let next_order = ladder.next_free_order();

    if let Some(requested) = request.stage_order
        && requested != next_order
    {
        return Err(StorageError::ConstraintViolation(format!(
            "Stages are appended in sequence; the next stage must have order {}",
            next_order
        )));
    }

    let stage = repo.create(request, next_order).await?;
    tracing::info!(stage_id = %stage.stage_id, stage_order = stage.stage_order, "Stage created");

    Ok(stage)
}

pub async fn update_stage(
    pool: &PgPool,
    existing: &CompetitionStage,
    request: &UpdateStageRequest,
) -> Result<CompetitionStage> {
    let repo = StageRepository::new(pool);
    repo.update(existing, request).await
}

/// Delete the last stage, provided no participant has progress in it
pub async fn delete_stage(pool: &PgPool, id: Uuid) -> Result<()> {
    let repo = StageRepository::new(pool);
    let ladder = StageLadder::new(repo.list().await?)?;

    let stage = ladder.by_id(id).ok_or(StorageError::NotFound)?;
    if ladder.last().map(|s| s.stage_id) != Some(stage.stage_id) {
        return Err(StorageError::ConstraintViolation(
            "Only the last stage can be deleted".to_string(),
        ));
    }

    if repo.count_progress(id).await? > 0 {
        return Err(StorageError::ConstraintViolation(
            "Stage is referenced by participant progress".to_string(),
        ));
    }

    repo.delete(id).await
}
