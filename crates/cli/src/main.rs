use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use storage::{
    Database,
    models::AdminDecision,
    repository::stage::StageRepository,
    services::{ProgressionEngine, StageLadder},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "stagectl")]
#[command(about = "Competition stage progression tooling", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Apply pending migrations before running the command
    #[arg(long)]
    migrate: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open active stages and expire ended ones; meant to be run from cron
    Sweep {
        /// Evaluate stage windows as of this date instead of today (UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Record an admin decision on a registration
    Decide {
        registration_id: Uuid,

        #[arg(value_parser = parse_decision)]
        status: AdminDecision,
    },
    /// Report gaps or a missing first stage in the stage sequence
    CheckStages,
}

fn parse_decision(raw: &str) -> Result<AdminDecision, String> {
    raw.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("stagectl={},storage={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&cli.database_url)
        .await
        .context("Failed to connect to database")?;
    let db = Database::from_pool(pool);

    if cli.migrate {
        db.run_migrations()
            .await
            .context("Failed to run migrations")?;
    }

    match cli.command {
        Commands::Sweep { today } => handle_sweep(&db, today).await?,
        Commands::Decide {
            registration_id,
            status,
        } => handle_decide(&db, registration_id, status).await?,
        Commands::CheckStages => handle_check_stages(&db).await?,
    }

    Ok(())
}

async fn handle_sweep(db: &Database, today: Option<NaiveDate>) -> anyhow::Result<()> {
    let today = today.unwrap_or_else(|| Utc::now().date_naive());

    let report = ProgressionEngine::new(db.pool())
        .sweep(today)
        .await
        .context("Sweep failed")?;

    println!("{}", serde_json::to_string(&report)?);

    if !report.failed_stages.is_empty() {
        bail!("{} stage(s) failed to update", report.failed_stages.len());
    }

    Ok(())
}

async fn handle_decide(
    db: &Database,
    registration_id: Uuid,
    decision: AdminDecision,
) -> anyhow::Result<()> {
    let snapshot = ProgressionEngine::new(db.pool())
        .decide(registration_id, decision)
        .await
        .with_context(|| format!("Decision on registration {} failed", registration_id))?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn handle_check_stages(db: &Database) -> anyhow::Result<()> {
    let stages = StageRepository::new(db.pool())
        .list()
        .await
        .context("Failed to load stages")?;
    let ladder = StageLadder::new(stages)?;

    for stage in ladder.iter() {
        println!(
            "{:>3}  {:<30} {} .. {}",
            stage.stage_order, stage.name, stage.start_date, stage.end_date
        );
    }

    if ladder.first().is_none() {
        bail!("No stage with order 1; approvals will fail until one exists");
    }

    let gaps = ladder.gaps();
    if !gaps.is_empty() {
        bail!("Stage sequence has gaps at orders {:?}", gaps);
    }

    tracing::info!("{} stage(s), sequence is contiguous", ladder.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_decide_rejects_cancelled() {
        let id = Uuid::new_v4().to_string();
        let args = ["stagectl", "--database-url", "postgres://x", "decide", &id, "cancelled"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = ["stagectl", "--database-url", "postgres://x", "decide", &id, "approved"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Decide {
                status: AdminDecision::Approved,
                ..
            }
        ));
    }

    #[test]
    fn test_sweep_accepts_date_override() {
        let args = ["stagectl", "--database-url", "postgres://x", "sweep", "--today", "2025-06-01"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Sweep { today } => {
                assert_eq!(today, NaiveDate::from_ymd_opt(2025, 6, 1));
            }
            _ => panic!("expected sweep"),
        }
    }
}
