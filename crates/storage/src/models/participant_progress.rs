use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Status of one participant at one stage.
///
/// `approved` and `rejected` are final for the stage; the participant moves on
/// through the next stage's row instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "progress_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Submitted,
    Approved,
    Rejected,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ParticipantProgress {
    pub progress_id: Uuid,
    pub participant_id: Uuid,
    pub competition_stage_id: Uuid,
    pub status: ProgressStatus,
    pub feedback: Option<String>,
    pub submitted_at: Option<chrono::NaiveDateTime>,
    pub approved_at: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// A progress row joined with the stage it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StageProgress {
    pub progress_id: Uuid,
    pub competition_stage_id: Uuid,
    pub stage_name: String,
    pub stage_order: i32,
    pub status: ProgressStatus,
    pub feedback: Option<String>,
    pub submitted_at: Option<chrono::NaiveDateTime>,
    pub approved_at: Option<chrono::NaiveDateTime>,
}
