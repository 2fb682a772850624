use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::DailyRecord;
use super::task::Task;

/// The whole persisted progress document.
///
/// Field order here is the field order of `state.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Current level, starting at 1
    #[serde(default = "default_level")]
    pub level: u32,
    /// Lifetime points credited by commits
    #[serde(default)]
    pub total_points: u64,
    /// Lifetime number of committed on-target days
    #[serde(default)]
    pub days_completed: u32,
    /// On-target days committed in the current cycle
    #[serde(default)]
    pub week_progress: u32,
    /// Per-day records, keyed `YYYY-MM-DD`
    #[serde(default)]
    pub history: BTreeMap<NaiveDate, DailyRecord>,
    /// User-added tasks, in the order they were added
    #[serde(default)]
    pub custom_tasks: Vec<Task>,
}

fn default_level() -> u32 {
    1
}

impl Default for ProgressState {
    fn default() -> Self {
        ProgressState {
            level: default_level(),
            total_points: 0,
            days_completed: 0,
            week_progress: 0,
            history: BTreeMap::new(),
            custom_tasks: Vec::new(),
        }
    }
}

impl ProgressState {
    pub fn record(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.history.get(&date)
    }
}
