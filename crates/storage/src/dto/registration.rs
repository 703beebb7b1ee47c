use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{AdminDecision, RegistrationStatus, TeamRegistration};

/// Request payload for registering a team in a competition category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRegistrationRequest {
    pub user_id: Uuid,

    pub competition_category_id: Uuid,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Team name must be between 1 and 255 characters"
    ))]
    pub team_name: String,
}

/// Admin decision on a registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRegistrationStatusRequest {
    #[validate(custom(function = "validate_decision"))]
    #[schema(example = "approved")]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RegistrationFilter {
    /// One of pending, approved, rejected, cancelled
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub competition_category_id: Uuid,
    pub team_name: String,
    pub status: RegistrationStatus,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

fn validate_decision(status: &str) -> Result<(), validator::ValidationError> {
    status.parse::<AdminDecision>().map(|_| ()).map_err(|_| {
        let mut error = validator::ValidationError::new("invalid_status");
        error.message = Some("Status must be one of pending, approved, rejected".into());
        error
    })
}

impl UpdateRegistrationStatusRequest {
    /// Only meaningful after `validate()` has passed.
    pub fn decision(&self) -> Result<AdminDecision, String> {
        self.status.parse()
    }
}

impl RegistrationFilter {
    pub fn status(&self) -> Result<Option<RegistrationStatus>, String> {
        self.status
            .as_deref()
            .map(str::parse::<RegistrationStatus>)
            .transpose()
    }
}

impl From<TeamRegistration> for RegistrationResponse {
    fn from(reg: TeamRegistration) -> Self {
        Self {
            registration_id: reg.registration_id,
            user_id: reg.user_id,
            competition_category_id: reg.competition_category_id,
            team_name: reg.team_name,
            status: reg.status,
            created_at: reg.created_at,
            updated_at: reg.updated_at,
        }
    }
}
