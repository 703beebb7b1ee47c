use std::time::Duration;

use anyhow::Context;
use storage::Database;
use utoipa::OpenApi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod scheduler;

use config::Config;
use features::{admin, progress, registrations, stages};
use middleware::auth::ApiKeys;

#[derive(OpenApi)]
#[openapi(
    paths(
        stages::handlers::list_stages,
        stages::handlers::create_stage,
        stages::handlers::update_stage,
        stages::handlers::delete_stage,
        registrations::handlers::list_registrations,
        registrations::handlers::create_registration,
        registrations::handlers::get_progress,
        registrations::handlers::update_status,
        progress::handlers::submit,
        progress::handlers::set_feedback,
        admin::handlers::run_sweep,
    ),
    components(
        schemas(
            storage::dto::stage::CreateStageRequest,
            storage::dto::stage::UpdateStageRequest,
            storage::dto::stage::StageResponse,
            storage::dto::registration::CreateRegistrationRequest,
            storage::dto::registration::UpdateRegistrationStatusRequest,
            storage::dto::registration::RegistrationResponse,
            storage::dto::progress::ProgressionSnapshot,
            storage::dto::progress::SweepReport,
            storage::dto::progress::FeedbackRequest,
            storage::dto::common::PaginationMeta,
            storage::models::CompetitionStage,
            storage::models::TeamRegistration,
            storage::models::ParticipantProgress,
            storage::models::StageProgress,
            storage::models::RegistrationStatus,
            storage::models::ProgressStatus,
            storage::models::AdminDecision,
        )
    ),
    tags(
        (name = "stages", description = "Competition stage sequence"),
        (name = "registrations", description = "Team registrations and admin decisions"),
        (name = "progress", description = "Per-stage participant progress"),
        (name = "admin", description = "Operational endpoints"),
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting competition progression API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, admin endpoints will reject every request");
    }

    if config.sweep_interval_secs > 0 {
        tracing::info!(
            "Sweeping stage progress every {} seconds",
            config.sweep_interval_secs
        );
        scheduler::spawn_sweeper(db.clone(), Duration::from_secs(config.sweep_interval_secs));
    } else {
        tracing::info!("In-process sweep disabled, expecting an external scheduler");
    }

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);

    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    axum::serve(listener, routes::app(db, api_keys))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
