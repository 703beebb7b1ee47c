use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::ladder::StageLadder;
use super::planner::{ApprovalPlan, plan_approval, plan_sweep};
use crate::dto::progress::{ProgressionSnapshot, SweepReport};
use crate::error::{Result, StorageError};
use crate::models::{
    AdminDecision, CompetitionStage, ParticipantProgress, ProgressStatus, RegistrationStatus,
    TeamRegistration,
};
use crate::repository::progress::ProgressRepository;
use crate::repository::registration::RegistrationRepository;

/// Key for the transaction-scoped advisory lock held while a sweep runs.
pub const SWEEP_LOCK_KEY: i64 = 0x5354_4147_4553_5750;

const DEFAULT_SWEEP_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Moves participants through competition stages.
///
/// Admin decisions run in one transaction each and lock the registration row
/// first, so two decisions for the same participant are applied one after the
/// other. Sweeps are serialised with a Postgres advisory lock.
pub struct ProgressionEngine<'a> {
    pool: &'a PgPool,
    sweep_lock_timeout: Duration,
}

impl<'a> ProgressionEngine<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            sweep_lock_timeout: DEFAULT_SWEEP_LOCK_TIMEOUT,
        }
    }

    /// How long a sweep waits on a locked progress row before giving up on
    /// that stage.
    pub fn with_sweep_lock_timeout(mut self, timeout: Duration) -> Self {
        self.sweep_lock_timeout = timeout;
        self
    }

    /// Record an admin decision on a registration and, on approval, advance
    /// the participant by at most one stage.
    pub async fn decide(
        &self,
        registration_id: Uuid,
        decision: AdminDecision,
    ) -> Result<ProgressionSnapshot> {
        match self.decide_once(registration_id, decision).await {
            Err(e) if e.is_retryable() => {
                warn!(%registration_id, error = %e, "Decision conflicted with a concurrent write, retrying");
                self.decide_once(registration_id, decision)
                    .await
                    .map_err(|e| {
                        if e.is_retryable() {
                            StorageError::Conflict(format!(
                                "Registration {} is being updated concurrently",
                                registration_id
                            ))
                        } else {
                            e
                        }
                    })?;
            }
            other => other?,
        }

        self.snapshot(registration_id).await
    }

    async fn decide_once(&self, registration_id: Uuid, decision: AdminDecision) -> Result<()> {
        let now = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        let registration = self
            .update_registration_status(registration_id, decision, &mut tx)
            .await?;
        debug!(%registration_id, status = %registration.status, "Registration status updated");

        if decision == AdminDecision::Approved {
            let ladder = StageLadder::new(self.load_stages(&mut tx).await?)?;
            let progress = self.lock_progress(registration_id, &mut tx).await?;
            let plan = plan_approval(&ladder, &progress)?;

            if plan.is_noop() {
                debug!(%registration_id, "Participant already approved at the final stage");
            } else {
                self.apply_plan(registration_id, &plan, now, &mut tx).await?;

                info!(
                    %registration_id,
                    seeded = plan.seed_first.is_some(),
                    approved = plan.approve.is_some(),
                    opened = plan.open_next.is_some(),
                    "Approval applied"
                );
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// The UPDATE takes the row lock that serialises decisions per participant.
    async fn update_registration_status(
        &self,
        registration_id: Uuid,
        decision: AdminDecision,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<TeamRegistration> {
        let status: RegistrationStatus = decision.into();

        let registration = sqlx::query_as::<_, TeamRegistration>(
            r#"
            UPDATE team_registrations
            SET status = $2, updated_at = NOW()
            WHERE registration_id = $1
            RETURNING registration_id, user_id, competition_category_id, team_name,
                      status, created_at, updated_at
            "#,
        )
        .bind(registration_id)
        .bind(status)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(registration)
    }

    async fn load_stages(&self, tx: &mut Transaction<'_, Postgres>) -> Result<Vec<CompetitionStage>> {
        let stages = sqlx::query_as::<_, CompetitionStage>(
            r#"
            SELECT stage_id, name, stage_order, start_date, end_date, created_at
            FROM competition_stages
            ORDER BY stage_order
            "#,
        )
        .fetch_all(&mut **tx)
        .await?;

        Ok(stages)
    }

    async fn lock_progress(
        &self,
        participant_id: Uuid,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<ParticipantProgress>> {
        let rows = sqlx::query_as::<_, ParticipantProgress>(
            r#"
            SELECT progress_id, participant_id, competition_stage_id, status, feedback,
                   submitted_at, approved_at, created_at, updated_at
            FROM participant_progress
            WHERE participant_id = $1
            FOR UPDATE
            "#,
        )
        .bind(participant_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows)
    }

    async fn apply_plan(
        &self,
        participant_id: Uuid,
        plan: &ApprovalPlan,
        now: NaiveDateTime,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<()> {
        if let Some(stage_id) = plan.seed_first {
            sqlx::query(
                r#"
                INSERT INTO participant_progress
                    (participant_id, competition_stage_id, status, approved_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(participant_id)
            .bind(stage_id)
            .bind(ProgressStatus::Approved)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }

        if let Some(progress_id) = plan.approve {
            sqlx::query(
                r#"
                UPDATE participant_progress
                SET status = $2, approved_at = $3, updated_at = NOW()
                WHERE progress_id = $1 AND status <> $2
                "#,
            )
            .bind(progress_id)
            .bind(ProgressStatus::Approved)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }

        if let Some(stage_id) = plan.open_next {
            sqlx::query(
                r#"
                INSERT INTO participant_progress (participant_id, competition_stage_id, status)
                VALUES ($1, $2, $3)
                ON CONFLICT (participant_id, competition_stage_id) DO NOTHING
                "#,
            )
            .bind(participant_id)
            .bind(stage_id)
            .bind(ProgressStatus::NotStarted)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Open stages whose window contains `today` and reject unfinished work in
    /// stages that ended before it.
    ///
    /// The sweep runs in one outer transaction holding a transaction-scoped
    /// advisory lock, so the lock goes away with the transaction even when the
    /// caller drops the future. Each stage is updated under its own savepoint,
    /// and a stage that fails is rolled back to it and reported while the
    /// others continue.
    pub async fn sweep(&self, today: NaiveDate) -> Result<SweepReport> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_xact_lock($1)")
            .bind(SWEEP_LOCK_KEY)
            .fetch_one(&mut *tx)
            .await?;

        if !locked {
            warn!("Another sweep is already running, skipping");
            tx.rollback().await?;
            return Ok(SweepReport {
                skipped: true,
                ..SweepReport::default()
            });
        }

        // Bounds how long one stage may wait on rows held by a decision.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.sweep_lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        let report = self.sweep_locked(&mut tx, today).await?;
        tx.commit().await?;

        info!(
            %today,
            updated_count = report.updated_count,
            rejected_count = report.rejected_count,
            failed_stages = report.failed_stages.len(),
            "Sweep finished"
        );

        Ok(report)
    }

    async fn sweep_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        today: NaiveDate,
    ) -> Result<SweepReport> {
        let ladder = StageLadder::new(self.load_stages(tx).await?)?;
        let mut report = SweepReport::default();

        if ladder.is_empty() {
            debug!("No competition stages configured, nothing to sweep");
            return Ok(report);
        }

        let plan = plan_sweep(&ladder, today);

        for stage_id in plan.activate {
            match Self::transition_stage(
                tx,
                stage_id,
                ProgressStatus::NotStarted,
                ProgressStatus::InProgress,
            )
            .await
            {
                Ok(count) => report.updated_count += count,
                Err(e) => {
                    error!(%stage_id, error = %e, "Failed to open progress for active stage");
                    report.failed_stages.push(stage_id);
                }
            }
        }

        for stage_id in plan.expire {
            match Self::transition_stage(
                tx,
                stage_id,
                ProgressStatus::InProgress,
                ProgressStatus::Rejected,
            )
            .await
            {
                Ok(count) => report.rejected_count += count,
                Err(e) => {
                    error!(%stage_id, error = %e, "Failed to expire progress for ended stage");
                    report.failed_stages.push(stage_id);
                }
            }
        }

        Ok(report)
    }

    /// Runs under a savepoint of the sweep transaction.
    async fn transition_stage(
        tx: &mut Transaction<'_, Postgres>,
        stage_id: Uuid,
        from: ProgressStatus,
        to: ProgressStatus,
    ) -> Result<u64> {
        let mut savepoint = tx.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE participant_progress
            SET status = $3, updated_at = NOW()
            WHERE competition_stage_id = $1 AND status = $2
            "#,
        )
        .bind(stage_id)
        .bind(from)
        .bind(to)
        .execute(&mut *savepoint)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                savepoint.rollback().await?;
                return Err(e.into());
            }
        };

        savepoint.commit().await?;

        if result.rows_affected() > 0 {
            debug!(%stage_id, %from, %to, rows = result.rows_affected(), "Stage progress transitioned");
        }

        Ok(result.rows_affected())
    }

    /// A participant hands in work for a stage that is underway.
    pub async fn submit(&self, progress_id: Uuid) -> Result<ParticipantProgress> {
        let now = Utc::now().naive_utc();

        let updated = sqlx::query_as::<_, ParticipantProgress>(
            r#"
            UPDATE participant_progress
            SET status = $2, submitted_at = $3, updated_at = NOW()
            WHERE progress_id = $1 AND status = $4
            RETURNING progress_id, participant_id, competition_stage_id, status, feedback,
                      submitted_at, approved_at, created_at, updated_at
            "#,
        )
        .bind(progress_id)
        .bind(ProgressStatus::Submitted)
        .bind(now)
        .bind(ProgressStatus::InProgress)
        .fetch_optional(self.pool)
        .await?;

        match updated {
            Some(progress) => Ok(progress),
            None => {
                let existing = ProgressRepository::new(self.pool).find_by_id(progress_id).await?;
                let message = if existing.status.is_terminal() {
                    format!("Stage was already decided as {}", existing.status)
                } else {
                    format!(
                        "Progress is {}, only in_progress work can be submitted",
                        existing.status
                    )
                };
                Err(StorageError::InvalidState(message))
            }
        }
    }

    pub async fn snapshot(&self, registration_id: Uuid) -> Result<ProgressionSnapshot> {
        let registration = RegistrationRepository::new(self.pool)
            .find_by_id(registration_id)
            .await?;
        let progress = ProgressRepository::new(self.pool)
            .list_for_participant(registration_id)
            .await?;

        Ok(ProgressionSnapshot::new(registration.into(), progress))
    }
}
