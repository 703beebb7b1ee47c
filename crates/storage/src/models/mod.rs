mod competition_stage;
mod participant_progress;
mod team_registration;

pub use competition_stage::CompetitionStage;
pub use participant_progress::{ParticipantProgress, ProgressStatus, StageProgress};
pub use team_registration::{AdminDecision, RegistrationStatus, TeamRegistration};
