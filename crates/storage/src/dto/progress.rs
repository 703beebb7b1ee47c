use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::registration::RegistrationResponse;
use crate::models::StageProgress;

/// A registration together with its progress through the stages.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgressionSnapshot {
    pub registration: RegistrationResponse,
    /// Ordered by stage order.
    pub progress: Vec<StageProgress>,
    pub current_stage_order: Option<i32>,
}

impl ProgressionSnapshot {
    pub fn new(registration: RegistrationResponse, progress: Vec<StageProgress>) -> Self {
        let current_stage_order = progress.iter().map(|p| p.stage_order).max();
        Self {
            registration,
            progress,
            current_stage_order,
        }
    }
}

/// Row counts produced by one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SweepReport {
    /// Rows moved from `not_started` to `in_progress`.
    pub updated_count: u64,
    /// Rows moved from `in_progress` to `rejected`.
    pub rejected_count: u64,
    pub failed_stages: Vec<Uuid>,
    /// Another sweep held the lock, nothing was done.
    pub skipped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct FeedbackRequest {
    #[validate(length(max = 5000, message = "Feedback must be at most 5000 characters"))]
    pub feedback: Option<String>,
}
