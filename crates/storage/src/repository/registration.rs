use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dto::common::PaginationParams;
use crate::dto::registration::CreateRegistrationRequest;
use crate::error::{Result, StorageError};
use crate::models::{RegistrationStatus, TeamRegistration};

pub struct RegistrationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RegistrationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Page through registrations, newest first, optionally narrowed to one status
    pub async fn list(
        &self,
        status: Option<RegistrationStatus>,
        pagination: &PaginationParams,
    ) -> Result<(Vec<TeamRegistration>, i64)> {
        let mut count = QueryBuilder::new(
            r#"
            SELECT COUNT(*)
            FROM team_registrations
            WHERE 1=1
            "#,
        );

        if let Some(status) = status {
            count.push(" AND status = ");
            count.push_bind(status);
        }

        let total_items = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::new(
            r#"
            SELECT registration_id, user_id, competition_category_id, team_name,
                   status, created_at, updated_at
            FROM team_registrations
            WHERE 1=1
            "#,
        );

        if let Some(status) = status {
            query.push(" AND status = ");
            query.push_bind(status);
        }

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(pagination.limit());
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let registrations = query
            .build_query_as::<TeamRegistration>()
            .fetch_all(self.pool)
            .await?;

        Ok((registrations, total_items))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<TeamRegistration> {
        let registration = sqlx::query_as::<_, TeamRegistration>(
            r#"
            SELECT registration_id, user_id, competition_category_id, team_name,
                   status, created_at, updated_at
            FROM team_registrations
            WHERE registration_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(registration)
    }

    pub async fn create(&self, req: &CreateRegistrationRequest) -> Result<TeamRegistration> {
        let registration = sqlx::query_as::<_, TeamRegistration>(
            r#"
            INSERT INTO team_registrations (user_id, competition_category_id, team_name)
            VALUES ($1, $2, $3)
            RETURNING registration_id, user_id, competition_category_id, team_name,
                      status, created_at, updated_at
            "#,
        )
        .bind(req.user_id)
        .bind(req.competition_category_id)
        .bind(&req.team_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                return StorageError::ConstraintViolation(
                    "User is already registered in this category".to_string(),
                );
            }
            err
        })?;

        Ok(registration)
    }
}
