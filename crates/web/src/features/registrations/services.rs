use sqlx::PgPool;
use storage::{
    dto::{
        common::PaginationParams,
        progress::ProgressionSnapshot,
        registration::CreateRegistrationRequest,
    },
    error::Result,
    models::{AdminDecision, RegistrationStatus, TeamRegistration},
    repository::registration::RegistrationRepository,
    services::ProgressionEngine,
};
use uuid::Uuid;

/// Page through registrations
pub async fn list_registrations(
    pool: &PgPool,
    status: Option<RegistrationStatus>,
    pagination: &PaginationParams,
) -> Result<(Vec<TeamRegistration>, i64)> {
    let repo = RegistrationRepository::new(pool);
    repo.list(status, pagination).await
}

pub async fn create_registration(
    pool: &PgPool,
    request: &CreateRegistrationRequest,
) -> Result<TeamRegistration> {
    let repo = RegistrationRepository::new(pool);
    repo.create(request).await
}

pub async fn get_progress(pool: &PgPool, registration_id: Uuid) -> Result<ProgressionSnapshot> {
    ProgressionEngine::new(pool).snapshot(registration_id).await
}

/// Apply an admin decision, advancing the participant on approval
pub async fn decide(
    pool: &PgPool,
    registration_id: Uuid,
    decision: AdminDecision,
) -> Result<ProgressionSnapshot> {
    let snapshot = ProgressionEngine::new(pool)
        .decide(registration_id, decision)
        .await?;

    tracing::info!(
        %registration_id,
        status = %snapshot.registration.status,
        current_stage_order = ?snapshot.current_stage_order,
        "Registration decision recorded"
    );

    Ok(snapshot)
}
