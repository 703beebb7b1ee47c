use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::CompetitionStage;

/// Request payload for appending a stage to the competition
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStageRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// Defaults to one past the current last stage; any other value is rejected.
    #[validate(range(min = 1, message = "Stage order must be positive"))]
    pub stage_order: Option<i32>,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,
}

/// Request payload for renaming a stage or moving its window
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStageRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StageResponse {
    pub stage_id: Uuid,
    pub name: String,
    pub stage_order: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn check_window(start: NaiveDate, end: NaiveDate) -> Result<(), &'static str> {
    if end < start {
        return Err("End date must be on or after start date");
    }
    Ok(())
}

impl CreateStageRequest {
    pub fn validate_dates(&self) -> Result<(), &'static str> {
        check_window(self.start_date, self.end_date)
    }
}

impl UpdateStageRequest {
    /// Checks the window that results from applying this update to `existing`.
    pub fn validate_dates(&self, existing: &CompetitionStage) -> Result<(), &'static str> {
        check_window(
            self.start_date.unwrap_or(existing.start_date),
            self.end_date.unwrap_or(existing.end_date),
        )
    }
}

impl From<CompetitionStage> for StageResponse {
    fn from(stage: CompetitionStage) -> Self {
        Self {
            stage_id: stage.stage_id,
            name: stage.name,
            stage_order: stage.stage_order,
            start_date: stage.start_date,
            end_date: stage.end_date,
        }
    }
}
