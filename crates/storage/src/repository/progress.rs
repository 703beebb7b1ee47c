use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{ParticipantProgress, StageProgress};

pub struct ProgressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProgressRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<ParticipantProgress> {
        let progress = sqlx::query_as::<_, ParticipantProgress>(
            r#"
            SELECT progress_id, participant_id, competition_stage_id, status, feedback,
                   submitted_at, approved_at, created_at, updated_at
            FROM participant_progress
            WHERE progress_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(progress)
    }

    /// Progress rows of one participant joined to their stage, in stage order
    pub async fn list_for_participant(&self, participant_id: Uuid) -> Result<Vec<StageProgress>> {
        let rows = sqlx::query_as::<_, StageProgress>(
            r#"
            SELECT p.progress_id, p.competition_stage_id, s.name AS stage_name, s.stage_order,
                   p.status, p.feedback, p.submitted_at, p.approved_at
            FROM participant_progress p
            INNER JOIN competition_stages s ON s.stage_id = p.competition_stage_id
            WHERE p.participant_id = $1
            ORDER BY s.stage_order
            "#,
        )
        .bind(participant_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn set_feedback(
        &self,
        id: Uuid,
        feedback: Option<&str>,
    ) -> Result<ParticipantProgress> {
        let progress = sqlx::query_as::<_, ParticipantProgress>(
            r#"
            UPDATE participant_progress
            SET feedback = $2, updated_at = NOW()
            WHERE progress_id = $1
            RETURNING progress_id, participant_id, competition_stage_id, status, feedback,
                      submitted_at, approved_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(feedback)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(progress)
    }
}
