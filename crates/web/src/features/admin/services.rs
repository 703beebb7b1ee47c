use chrono::NaiveDate;
use sqlx::PgPool;
use storage::{dto::progress::SweepReport, error::Result, services::ProgressionEngine};

pub async fn run_sweep(pool: &PgPool, today: NaiveDate) -> Result<SweepReport> {
    ProgressionEngine::new(pool).sweep(today).await
}
