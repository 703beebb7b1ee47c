use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::stage::{CreateStageRequest, UpdateStageRequest};
use crate::error::{Result, StorageError};
use crate::models::CompetitionStage;

/// Repository for CompetitionStage database operations
pub struct StageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StageRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all stages in competition order
    pub async fn list(&self) -> Result<Vec<CompetitionStage>> {
        let stages = sqlx::query_as::<_, CompetitionStage>(
            r#"
            SELECT stage_id, name, stage_order, start_date, end_date, created_at
            FROM competition_stages
            ORDER BY stage_order
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(stages)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<CompetitionStage> {
        let stage = sqlx::query_as::<_, CompetitionStage>(
            r#"
            SELECT stage_id, name, stage_order, start_date, end_date, created_at
            FROM competition_stages
            WHERE stage_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(stage)
    }

    pub async fn create(&self, req: &CreateStageRequest, stage_order: i32) -> Result<CompetitionStage> {
        let stage = sqlx::query_as::<_, CompetitionStage>(
            r#"
            INSERT INTO competition_stages (name, stage_order, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            RETURNING stage_id, name, stage_order, start_date, end_date, created_at
            "#,
        )
        .bind(&req.name)
        .bind(stage_order)
        .bind(req.start_date)
        .bind(req.end_date)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                return StorageError::ConstraintViolation(format!(
                    "Stage order {} is already taken",
                    stage_order
                ));
            }
            err
        })?;

        Ok(stage)
    }

    pub async fn update(
        &self,
        existing: &CompetitionStage,
        req: &UpdateStageRequest,
    ) -> Result<CompetitionStage> {
        let stage = sqlx::query_as::<_, CompetitionStage>(
            r#"
            UPDATE competition_stages
            SET
                name = $2,
                start_date = $3,
                end_date = $4
            WHERE stage_id = $1
            RETURNING stage_id, name, stage_order, start_date, end_date, created_at
            "#,
        )
        .bind(existing.stage_id)
        .bind(req.name.as_deref().unwrap_or(&existing.name))
        .bind(req.start_date.unwrap_or(existing.start_date))
        .bind(req.end_date.unwrap_or(existing.end_date))
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(stage)
    }

    /// Number of progress rows pointing at the stage
    pub async fn count_progress(&self, id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM participant_progress
            WHERE competition_stage_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM competition_stages
            WHERE stage_id = $1
            "#,
        )
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_foreign_key_violation() {
                return StorageError::ConstraintViolation(
                    "Stage is referenced by participant progress".to_string(),
                );
            }
            err
        })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
