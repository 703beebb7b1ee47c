//! Pure decision logic for stage progression.
//!
//! Nothing here touches the database: the engine loads the ladder and a
//! participant's progress rows, asks for a plan, and applies it inside one
//! transaction.

use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use super::ladder::{NextStage, StageLadder};
use crate::error::{Result, StorageError};
use crate::models::{ParticipantProgress, ProgressStatus};

/// Writes needed to apply one approval to a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalPlan {
    /// Stage to create an already-approved first row for.
    pub seed_first: Option<Uuid>,
    /// Existing progress row to mark approved.
    pub approve: Option<Uuid>,
    /// Stage to open with a `not_started` row.
    pub open_next: Option<Uuid>,
}

impl ApprovalPlan {
    pub fn is_noop(&self) -> bool {
        self.seed_first.is_none() && self.approve.is_none() && self.open_next.is_none()
    }
}

/// Stages whose rows the sweep should touch on a given day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepPlan {
    /// `not_started` rows in these stages become `in_progress`.
    pub activate: Vec<Uuid>,
    /// `in_progress` rows in these stages become `rejected`.
    pub expire: Vec<Uuid>,
}

/// Approve the participant's latest stage and open the one after it.
///
/// The latest stage is the one with the highest order among the existing
/// rows. A participant with no rows starts at order 1; a ladder without an
/// order-1 stage is a configuration error.
pub fn plan_approval(ladder: &StageLadder, progress: &[ParticipantProgress]) -> Result<ApprovalPlan> {
    let mut plan = ApprovalPlan::default();

    let latest = progress
        .iter()
        .filter_map(|row| {
            ladder
                .by_id(row.competition_stage_id)
                .map(|stage| (stage.stage_order, row))
        })
        .max_by_key(|(order, _)| *order);

    let current_order = match latest {
        None => {
            let first = ladder.first().ok_or_else(|| {
                StorageError::Configuration(
                    "No competition stage with order 1 is configured".to_string(),
                )
            })?;
            plan.seed_first = Some(first.stage_id);
            first.stage_order
        }
        Some((order, row)) => {
            if row.status != ProgressStatus::Approved {
                plan.approve = Some(row.progress_id);
            }
            order
        }
    };

    match ladder.next_after(current_order) {
        NextStage::Stage(next) => {
            let exists = progress
                .iter()
                .any(|row| row.competition_stage_id == next.stage_id);
            if !exists {
                plan.open_next = Some(next.stage_id);
            }
        }
        NextStage::Gap { missing_order } => {
            warn!(
                current_order,
                missing_order, "Stage sequence has a gap, participant cannot advance"
            );
        }
        NextStage::Last => {}
    }

    Ok(plan)
}

pub fn plan_sweep(ladder: &StageLadder, today: NaiveDate) -> SweepPlan {
    SweepPlan {
        activate: ladder.active_on(today).map(|s| s.stage_id).collect(),
        expire: ladder.expired_on(today).map(|s| s.stage_id).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompetitionStage;
    use crate::services::ladder::tests::{day, stage};

    /// In-memory stand-in for the progress table of one participant.
    struct Participant {
        id: Uuid,
        rows: Vec<ParticipantProgress>,
    }

    impl Participant {
        fn new() -> Self {
            Self {
                id: Uuid::new_v4(),
                rows: Vec::new(),
            }
        }

        fn insert(&mut self, stage_id: Uuid, status: ProgressStatus) {
            self.rows.push(ParticipantProgress {
                progress_id: Uuid::new_v4(),
                participant_id: self.id,
                competition_stage_id: stage_id,
                status,
                feedback: None,
                submitted_at: None,
                approved_at: None,
                created_at: chrono::NaiveDateTime::default(),
                updated_at: chrono::NaiveDateTime::default(),
            });
        }

        fn apply(&mut self, plan: &ApprovalPlan) {
            if let Some(stage_id) = plan.seed_first {
                self.insert(stage_id, ProgressStatus::Approved);
            }
            if let Some(progress_id) = plan.approve {
                let row = self
                    .rows
                    .iter_mut()
                    .find(|r| r.progress_id == progress_id)
                    .unwrap();
                row.status = ProgressStatus::Approved;
            }
            if let Some(stage_id) = plan.open_next {
                self.insert(stage_id, ProgressStatus::NotStarted);
            }
        }

        fn approve(&mut self, ladder: &StageLadder) -> ApprovalPlan {
            let plan = plan_approval(ladder, &self.rows).unwrap();
            self.apply(&plan);
            plan
        }

        fn sweep(&mut self, ladder: &StageLadder, today: NaiveDate) -> usize {
            let plan = plan_sweep(ladder, today);
            let mut touched = 0;
            for row in &mut self.rows {
                if plan.activate.contains(&row.competition_stage_id)
                    && row.status == ProgressStatus::NotStarted
                {
                    row.status = ProgressStatus::InProgress;
                    touched += 1;
                }
            }
            for row in &mut self.rows {
                if plan.expire.contains(&row.competition_stage_id)
                    && row.status == ProgressStatus::InProgress
                {
                    row.status = ProgressStatus::Rejected;
                    touched += 1;
                }
            }
            touched
        }

        fn status_at(&self, stage: &CompetitionStage) -> Option<ProgressStatus> {
            self.rows
                .iter()
                .find(|r| r.competition_stage_id == stage.stage_id)
                .map(|r| r.status)
        }

        fn current_order(&self, ladder: &StageLadder) -> Option<i32> {
            self.rows
                .iter()
                .filter_map(|r| ladder.by_id(r.competition_stage_id))
                .map(|s| s.stage_order)
                .max()
        }
    }

    fn two_stages() -> StageLadder {
        StageLadder::new(vec![
            stage("Registration", 1, day(1), day(5)),
            stage("Preliminary", 2, day(6), day(10)),
        ])
        .unwrap()
    }

    fn three_stages() -> StageLadder {
        StageLadder::new(vec![
            stage("Registration", 1, day(1), day(5)),
            stage("Preliminary", 2, day(6), day(10)),
            stage("Final", 3, day(11), day(15)),
        ])
        .unwrap()
    }

    #[test]
    fn test_fresh_participant_is_seeded_and_advanced() {
        let ladder = two_stages();
        let mut team = Participant::new();

        team.approve(&ladder);

        let registration = ladder.by_order(1).unwrap();
        let preliminary = ladder.by_order(2).unwrap();
        assert_eq!(team.rows.len(), 2);
        assert_eq!(team.status_at(registration), Some(ProgressStatus::Approved));
        assert_eq!(team.status_at(preliminary), Some(ProgressStatus::NotStarted));
    }

    #[test]
    fn test_mid_sequence_approval_opens_final() {
        let ladder = three_stages();
        let mut team = Participant::new();

        team.approve(&ladder);
        team.approve(&ladder);

        assert_eq!(
            team.status_at(ladder.by_order(2).unwrap()),
            Some(ProgressStatus::Approved)
        );
        assert_eq!(
            team.status_at(ladder.by_order(3).unwrap()),
            Some(ProgressStatus::NotStarted)
        );
    }

    #[test]
    fn test_mid_sequence_approval_without_final_is_quiet() {
        let ladder = two_stages();
        let mut team = Participant::new();

        team.approve(&ladder);
        let plan = team.approve(&ladder);

        assert!(plan.open_next.is_none());
        assert_eq!(team.rows.len(), 2);
        assert_eq!(
            team.status_at(ladder.by_order(2).unwrap()),
            Some(ProgressStatus::Approved)
        );
    }

    #[test]
    fn test_terminal_stage_is_stable() {
        let ladder = two_stages();
        let mut team = Participant::new();

        team.approve(&ladder);
        team.approve(&ladder);
        let rows_before = team.rows.len();

        for _ in 0..3 {
            let plan = team.approve(&ladder);
            assert!(plan.is_noop());
        }

        assert_eq!(team.rows.len(), rows_before);
        assert_eq!(team.current_order(&ladder), Some(2));
    }

    #[test]
    fn test_advancement_is_monotonic_and_never_skips() {
        let ladder = StageLadder::new(
            (1..=5).map(|o| stage(&format!("Stage {}", o), o, day(o as u32), day(o as u32))),
        )
        .unwrap();
        let mut team = Participant::new();
        let mut previous = 0;

        for _ in 0..8 {
            team.approve(&ladder);
            let current = team.current_order(&ladder).unwrap();
            assert!(current >= previous);
            assert!(current <= previous + 2);
            if previous > 0 {
                assert!(current - previous <= 1);
            }
            previous = current;
        }

        let mut orders: Vec<i32> = team
            .rows
            .iter()
            .map(|r| ladder.by_id(r.competition_stage_id).unwrap().stage_order)
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_approval_targets_highest_order_row() {
        let ladder = three_stages();
        let mut team = Participant::new();
        let registration = ladder.by_order(1).unwrap().stage_id;
        let preliminary = ladder.by_order(2).unwrap().stage_id;
        team.insert(registration, ProgressStatus::InProgress);
        team.insert(preliminary, ProgressStatus::NotStarted);

        let plan = plan_approval(&ladder, &team.rows).unwrap();

        assert_eq!(plan.approve, Some(team.rows[1].progress_id));
        assert_eq!(plan.open_next, Some(ladder.by_order(3).unwrap().stage_id));
    }

    #[test]
    fn test_missing_first_stage_is_configuration_error() {
        let ladder = StageLadder::new(vec![stage("Preliminary", 2, day(6), day(10))]).unwrap();

        let result = plan_approval(&ladder, &[]);

        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }

    #[test]
    fn test_gap_stalls_participant() {
        let ladder = StageLadder::new(vec![
            stage("Registration", 1, day(1), day(5)),
            stage("Final", 3, day(11), day(15)),
        ])
        .unwrap();
        let mut team = Participant::new();

        let plan = team.approve(&ladder);

        assert!(plan.seed_first.is_some());
        assert!(plan.open_next.is_none());
        assert_eq!(team.rows.len(), 1);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let ladder = three_stages();
        let mut team = Participant::new();
        team.insert(ladder.by_order(1).unwrap().stage_id, ProgressStatus::InProgress);
        team.insert(ladder.by_order(2).unwrap().stage_id, ProgressStatus::NotStarted);

        let first = team.sweep(&ladder, day(7));
        let second = team.sweep(&ladder, day(7));

        assert_eq!(first, 2);
        assert_eq!(second, 0);
    }

    #[test]
    fn test_sweep_follows_stage_window() {
        let ladder = two_stages();
        let preliminary = ladder.by_order(2).unwrap().clone();

        let mut early = Participant::new();
        early.insert(preliminary.stage_id, ProgressStatus::NotStarted);
        early.sweep(&ladder, day(5));
        assert_eq!(early.status_at(&preliminary), Some(ProgressStatus::NotStarted));

        for today in [day(6), day(8), day(10)] {
            let mut team = Participant::new();
            team.insert(preliminary.stage_id, ProgressStatus::NotStarted);
            team.sweep(&ladder, today);
            assert_eq!(team.status_at(&preliminary), Some(ProgressStatus::InProgress));
        }

        let mut late = Participant::new();
        late.insert(preliminary.stage_id, ProgressStatus::InProgress);
        late.sweep(&ladder, day(11));
        assert_eq!(late.status_at(&preliminary), Some(ProgressStatus::Rejected));
    }

    #[test]
    fn test_sweep_leaves_submitted_and_unopened_rows() {
        let ladder = two_stages();
        let preliminary = ladder.by_order(2).unwrap().clone();

        let mut submitted = Participant::new();
        submitted.insert(preliminary.stage_id, ProgressStatus::Submitted);
        assert_eq!(submitted.sweep(&ladder, day(20)), 0);

        let mut never_opened = Participant::new();
        never_opened.insert(preliminary.stage_id, ProgressStatus::NotStarted);
        assert_eq!(never_opened.sweep(&ladder, day(20)), 0);
    }
}
