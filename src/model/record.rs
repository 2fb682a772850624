use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One calendar day's completion state.
///
/// `checked` is a `BTreeSet` so the persisted list is always sorted,
/// regardless of the order tasks were ticked in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Ids of the tasks checked on this day
    #[serde(default)]
    pub checked: BTreeSet<String>,
    /// Score computed from `checked` at the last save or commit
    #[serde(default)]
    pub points: u32,
    /// Whether `points` reached the level minimum when last evaluated
    #[serde(default)]
    pub met_target: bool,
    /// Set once this day has been applied to the day/cycle counters
    #[serde(default)]
    pub counted: bool,
    /// Points from this day already added to the lifetime total
    #[serde(default, skip_serializing_if = "is_zero")]
    pub committed_points: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl DailyRecord {
    pub fn is_checked(&self, task_id: &str) -> bool {
        self.checked.contains(task_id)
    }

    /// A fresh record that keeps only the accrual ledger.
    pub fn cleared(&self) -> Self {
        DailyRecord {
            committed_points: self.committed_points,
            ..Default::default()
        }
    }
}
