use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompetitionStage {
    pub stage_id: Uuid,
    pub name: String,
    pub stage_order: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: chrono::NaiveDateTime,
}

impl CompetitionStage {
    /// Both ends of the window are inclusive.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    pub fn is_expired_on(&self, day: NaiveDate) -> bool {
        self.end_date < day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(start: NaiveDate, end: NaiveDate) -> CompetitionStage {
        CompetitionStage {
            stage_id: Uuid::new_v4(),
            name: "Preliminary".to_string(),
            stage_order: 2,
            start_date: start,
            end_date: end,
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let s = stage(start, end);

        assert!(s.is_active_on(start));
        assert!(s.is_active_on(end));
        assert!(!s.is_expired_on(end));
        assert!(s.is_expired_on(end.succ_opt().unwrap()));
        assert!(!s.is_active_on(start.pred_opt().unwrap()));
    }
}
