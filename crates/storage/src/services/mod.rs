pub mod ladder;
pub mod planner;
pub mod progression;

pub use ladder::{NextStage, StageLadder};
pub use planner::{ApprovalPlan, SweepPlan, plan_approval, plan_sweep};
pub use progression::{ProgressionEngine, SWEEP_LOCK_KEY};
