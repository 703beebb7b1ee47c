use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::CompetitionStage;

/// Competition stages keyed by their `stage_order`.
#[derive(Debug, Clone, Default)]
pub struct StageLadder {
    by_order: BTreeMap<i32, CompetitionStage>,
}

/// Outcome of looking up the stage that follows a given order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStage<'a> {
    Stage(&'a CompetitionStage),
    /// Nothing follows; the participant has reached the final stage.
    Last,
    /// A higher stage exists but `missing_order` does not.
    Gap { missing_order: i32 },
}

impl StageLadder {
    pub fn new(stages: impl IntoIterator<Item = CompetitionStage>) -> Result<Self> {
        let mut by_order = BTreeMap::new();

        for stage in stages {
            let order = stage.stage_order;
            if by_order.insert(order, stage).is_some() {
                return Err(StorageError::Configuration(format!(
                    "Duplicate stage order {}",
                    order
                )));
            }
        }

        Ok(Self { by_order })
    }

    pub fn is_empty(&self) -> bool {
        self.by_order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_order.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompetitionStage> {
        self.by_order.values()
    }

    /// The stage with order 1. Newly approved participants start here.
    pub fn first(&self) -> Option<&CompetitionStage> {
        self.by_order.get(&1)
    }

    pub fn by_order(&self, order: i32) -> Option<&CompetitionStage> {
        self.by_order.get(&order)
    }

    pub fn by_id(&self, stage_id: Uuid) -> Option<&CompetitionStage> {
        self.by_order.values().find(|s| s.stage_id == stage_id)
    }

    pub fn last(&self) -> Option<&CompetitionStage> {
        self.by_order.values().next_back()
    }

    /// Order a newly appended stage must take.
    pub fn next_free_order(&self) -> i32 {
        self.last().map(|s| s.stage_order + 1).unwrap_or(1)
    }

    pub fn next_after(&self, order: i32) -> NextStage<'_> {
        let next_order = order + 1;

        match self.by_order.get(&next_order) {
            Some(stage) => NextStage::Stage(stage),
            None if self.by_order.range(next_order..).next().is_some() => NextStage::Gap {
                missing_order: next_order,
            },
            None => NextStage::Last,
        }
    }

    /// Orders between 1 and the highest order that have no stage.
    pub fn gaps(&self) -> Vec<i32> {
        let Some(last) = self.last() else {
            return Vec::new();
        };

        (1..last.stage_order)
            .filter(|order| !self.by_order.contains_key(order))
            .collect()
    }

    pub fn active_on(&self, day: NaiveDate) -> impl Iterator<Item = &CompetitionStage> {
        self.iter().filter(move |s| s.is_active_on(day))
    }

    pub fn expired_on(&self, day: NaiveDate) -> impl Iterator<Item = &CompetitionStage> {
        self.iter().filter(move |s| s.is_expired_on(day))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn stage(name: &str, order: i32, start: NaiveDate, end: NaiveDate) -> CompetitionStage {
        CompetitionStage {
            stage_id: Uuid::new_v4(),
            name: name.to_string(),
            stage_order: order,
            start_date: start,
            end_date: end,
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    pub(crate) fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[test]
    fn test_rejects_duplicate_orders() {
        let result = StageLadder::new(vec![
            stage("Registration", 1, day(1), day(5)),
            stage("Also registration", 1, day(6), day(9)),
        ]);

        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }

    #[test]
    fn test_next_after_distinguishes_last_and_gap() {
        let ladder = StageLadder::new(vec![
            stage("Registration", 1, day(1), day(5)),
            stage("Preliminary", 2, day(6), day(10)),
            stage("Final", 4, day(20), day(25)),
        ])
        .unwrap();

        match ladder.next_after(1) {
            NextStage::Stage(s) => assert_eq!(s.name, "Preliminary"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ladder.next_after(2), NextStage::Gap { missing_order: 3 });
        assert_eq!(ladder.next_after(4), NextStage::Last);
        assert_eq!(ladder.gaps(), vec![3]);
        assert_eq!(ladder.next_free_order(), 5);
    }

    #[test]
    fn test_first_requires_order_one() {
        let ladder = StageLadder::new(vec![stage("Preliminary", 2, day(6), day(10))]).unwrap();
        assert!(ladder.first().is_none());

        let empty = StageLadder::default();
        assert!(empty.is_empty());
        assert_eq!(empty.next_free_order(), 1);
        assert!(empty.gaps().is_empty());
    }

    #[test]
    fn test_active_and_expired_buckets() {
        let ladder = StageLadder::new(vec![
            stage("Registration", 1, day(1), day(5)),
            stage("Preliminary", 2, day(6), day(10)),
            stage("Final", 3, day(11), day(15)),
        ])
        .unwrap();

        let active: Vec<_> = ladder.active_on(day(6)).map(|s| s.stage_order).collect();
        let expired: Vec<_> = ladder.expired_on(day(6)).map(|s| s.stage_order).collect();

        assert_eq!(active, vec![2]);
        assert_eq!(expired, vec![1]);
    }
}
