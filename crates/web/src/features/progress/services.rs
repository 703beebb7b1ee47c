use sqlx::PgPool;
use storage::{
    error::Result,
    models::ParticipantProgress,
    repository::progress::ProgressRepository,
    services::ProgressionEngine,
};
use uuid::Uuid;

pub async fn submit(pool: &PgPool, progress_id: Uuid) -> Result<ParticipantProgress> {
    ProgressionEngine::new(pool).submit(progress_id).await
}

pub async fn set_feedback(
    pool: &PgPool,
    progress_id: Uuid,
    feedback: Option<&str>,
) -> Result<ParticipantProgress> {
    let repo = ProgressRepository::new(pool);
    repo.set_feedback(progress_id, feedback).await
}
