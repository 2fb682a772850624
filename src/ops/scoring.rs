use std::collections::BTreeSet;

use crate::model::level::LevelRules;
use crate::model::task::Task;

/// Sum the points of every task whose id is checked.
///
/// Checked ids with no matching task contribute nothing.
pub fn compute_score(tasks: &[Task], checked: &BTreeSet<String>) -> u32 {
    tasks
        .iter()
        .filter(|t| checked.contains(&t.id))
        .map(|t| t.points)
        .sum()
}

/// Whether `score` reaches the daily minimum for `level`.
pub fn evaluate_target(score: u32, level: u32, rules: &LevelRules) -> bool {
    score >= rules.daily_min_points(level)
}
