use chrono::NaiveDate;
use serde::Serialize;

use crate::model::level::LevelRules;
use crate::model::record::DailyRecord;
use crate::model::state::ProgressState;
use crate::ops::catalog::{id_exists, list_tasks};
use crate::ops::scoring::{compute_score, evaluate_target};

/// Error type for progress operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("task not found: {0}")]
    UnknownTask(String),
}

/// A level-up produced by a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Promotion {
    pub from: u32,
    pub to: u32,
}

/// What a commit changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub date: NaiveDate,
    pub points: u32,
    pub met_target: bool,
    /// True only on the commit that first applied this date to the counters
    pub newly_counted: bool,
    pub points_added: u32,
    pub promotion: Option<Promotion>,
}

/// Level and cycle metrics for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub level: u32,
    pub daily_min_points: u32,
    pub days_needed: u32,
    pub week_progress: u32,
    /// `week_progress / days_needed`, clamped to 1.0
    pub cycle_ratio: f64,
    pub total_points: u64,
    pub days_completed: u32,
    pub today: NaiveDate,
    pub today_points: u32,
    pub today_met_target: bool,
    pub today_counted: bool,
}

/// Record for `date`, created empty on first access.
pub fn ensure_day(state: &mut ProgressState, date: NaiveDate) -> &mut DailyRecord {
    state.history.entry(date).or_default()
}

/// Recompute today's score and target flag from the current catalog and level.
///
/// This is the checkpoint step: it never touches the cumulative counters,
/// so it may run any number of times per day.
pub fn refresh_today<'a>(
    state: &'a mut ProgressState,
    rules: &LevelRules,
    today: NaiveDate,
) -> &'a DailyRecord {
    let tasks = list_tasks(state);
    let level = state.level;
    let record = ensure_day(state, today);
    record.points = compute_score(&tasks, &record.checked);
    record.met_target = evaluate_target(record.points, level, rules);
    record
}

/// Set whether `task_id` is checked today. Returns true if anything changed.
pub fn set_checked(
    state: &mut ProgressState,
    rules: &LevelRules,
    today: NaiveDate,
    task_id: &str,
    checked: bool,
) -> Result<bool, ProgressError> {
    if !id_exists(state, task_id) {
        return Err(ProgressError::UnknownTask(task_id.to_string()));
    }
    let record = ensure_day(state, today);
    let changed = if checked {
        record.checked.insert(task_id.to_string())
    } else {
        record.checked.remove(task_id)
    };
    refresh_today(state, rules, today);
    Ok(changed)
}

/// Flip `task_id` for today. Returns the new checked flag.
pub fn toggle_task(
    state: &mut ProgressState,
    rules: &LevelRules,
    today: NaiveDate,
    task_id: &str,
) -> Result<bool, ProgressError> {
    let now_checked = !state
        .record(today)
        .is_some_and(|r| r.is_checked(task_id));
    set_checked(state, rules, today, task_id, now_checked)?;
    Ok(now_checked)
}

/// Discard today's checks. Counters and level are left alone.
pub fn reset_today(state: &mut ProgressState, today: NaiveDate) {
    let record = ensure_day(state, today);
    *record = record.cleared();
}

/// Apply today's result to the cumulative counters and promote if the
/// cycle is complete.
pub fn commit_day(
    state: &mut ProgressState,
    rules: &LevelRules,
    today: NaiveDate,
) -> CommitOutcome {
    refresh_today(state, rules, today);

    let record = ensure_day(state, today);
    let newly_counted = record.met_target && !record.counted;
    if newly_counted {
        record.counted = true;
    }
    let points = record.points;
    let met_target = record.met_target;
    let points_added = points.saturating_sub(record.committed_points);
    record.committed_points = record.committed_points.max(points);

    if newly_counted {
        state.days_completed += 1;
        state.week_progress += 1;
    }
    state.total_points += u64::from(points_added);

    let promotion = try_promote(state, rules);

    tracing::info!(
        %today,
        points,
        met_target,
        newly_counted,
        points_added,
        level = state.level,
        "day committed"
    );

    CommitOutcome {
        date: today,
        points,
        met_target,
        newly_counted,
        points_added,
        promotion,
    }
}

/// Advance one level when the cycle target is reached. Extra progress
/// beyond the target is dropped.
fn try_promote(state: &mut ProgressState, rules: &LevelRules) -> Option<Promotion> {
    if state.week_progress < rules.days_needed(state.level) {
        return None;
    }
    let from = state.level;
    state.level += 1;
    state.week_progress = 0;
    tracing::info!(from, to = state.level, "level up");
    Some(Promotion {
        from,
        to: state.level,
    })
}

/// Bring a loaded document back inside the level invariants.
///
/// Level 0 becomes 1, and `week_progress` is held below the current
/// level's `days_to_promote` (which a config change can lower). Promotion
/// still only happens on commit. Returns true if anything changed.
pub fn normalize(state: &mut ProgressState, rules: &LevelRules) -> bool {
    let mut changed = false;
    if state.level == 0 {
        tracing::warn!("stored level 0, treating as level 1");
        state.level = 1;
        changed = true;
    }
    let ceiling = rules.days_needed(state.level).saturating_sub(1);
    if state.week_progress > ceiling {
        tracing::warn!(
            week_progress = state.week_progress,
            days_needed = rules.days_needed(state.level),
            "cycle progress exceeds the level rule, clamping"
        );
        state.week_progress = ceiling;
        changed = true;
    }
    changed
}

pub fn summary(state: &ProgressState, rules: &LevelRules, today: NaiveDate) -> ProgressSummary {
    let rule = rules.for_level(state.level);
    let record = state.record(today);
    ProgressSummary {
        level: state.level,
        daily_min_points: rule.daily_min_points,
        days_needed: rule.days_to_promote,
        week_progress: state.week_progress,
        cycle_ratio: (f64::from(state.week_progress) / f64::from(rule.days_to_promote)).min(1.0),
        total_points: state.total_points,
        days_completed: state.days_completed,
        today,
        today_points: record.map_or(0, |r| r.points),
        today_met_target: record.is_some_and(|r| r.met_target),
        today_counted: record.is_some_and(|r| r.counted),
    }
}

/// Most recent `limit` days, newest first.
pub fn recent_history(state: &ProgressState, limit: usize) -> Vec<(NaiveDate, &DailyRecord)> {
    state
        .history
        .iter()
        .rev()
        .take(limit)
        .map(|(d, r)| (*d, r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::level::LevelRule;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, n).unwrap()
    }

    /// walk20 + six 10-point tasks = 75
    const SEVENTY_FIVE: &[&str] = &[
        "walk20",
        "chin_tuck",
        "scap_squeeze",
        "lat_stretch",
        "water2l",
        "sleep_23",
        "slr",
    ];

    /// walk20 + five 10-point tasks = 65
    const SIXTY_FIVE: &[&str] = &[
        "walk20",
        "chin_tuck",
        "scap_squeeze",
        "lat_stretch",
        "water2l",
        "sleep_23",
    ];

    fn check_all(state: &mut ProgressState, rules: &LevelRules, date: NaiveDate, ids: &[&str]) {
        for id in ids {
            set_checked(state, rules, date, id, true).unwrap();
        }
    }

    #[test]
    fn ensure_day_creates_empty_record() {
        let mut state = ProgressState::default();
        let rec = ensure_day(&mut state, day(1));
        assert_eq!(*rec, DailyRecord::default());
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn toggle_flips_and_rescores() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();

        assert!(toggle_task(&mut state, &rules, day(1), "walk20").unwrap());
        assert_eq!(state.record(day(1)).unwrap().points, 15);

        assert!(!toggle_task(&mut state, &rules, day(1), "walk20").unwrap());
        let rec = state.record(day(1)).unwrap();
        assert_eq!(rec.points, 0);
        assert!(rec.checked.is_empty());
    }

    #[test]
    fn unknown_task_is_rejected() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        let err = toggle_task(&mut state, &rules, day(1), "nope").unwrap_err();
        assert_eq!(err, ProgressError::UnknownTask("nope".into()));
        assert!(state.history.is_empty());
    }

    #[test]
    fn set_checked_is_idempotent() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        assert!(set_checked(&mut state, &rules, day(1), "slr", true).unwrap());
        assert!(!set_checked(&mut state, &rules, day(1), "slr", true).unwrap());
        assert_eq!(state.record(day(1)).unwrap().checked.len(), 1);
    }

    #[test]
    fn sixty_five_points_meets_level_one() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), SIXTY_FIVE);

        let rec = state.record(day(1)).unwrap();
        assert_eq!(rec.points, 65);
        assert!(rec.met_target);

        let outcome = commit_day(&mut state, &rules, day(1));
        assert!(outcome.newly_counted);
        assert_eq!(outcome.points_added, 65);
        assert!(outcome.promotion.is_none());
        assert_eq!(state.days_completed, 1);
        assert_eq!(state.week_progress, 1);
        assert_eq!(state.total_points, 65);
        assert_eq!(state.level, 1);
    }

    #[test]
    fn double_commit_counts_once() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), SIXTY_FIVE);

        commit_day(&mut state, &rules, day(1));
        let second = commit_day(&mut state, &rules, day(1));

        assert!(!second.newly_counted);
        assert_eq!(second.points_added, 0);
        assert_eq!(state.days_completed, 1);
        assert_eq!(state.week_progress, 1);
        assert_eq!(state.total_points, 65);
    }

    #[test]
    fn recommit_after_more_checks_credits_difference() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), SIXTY_FIVE);
        commit_day(&mut state, &rules, day(1));

        set_checked(&mut state, &rules, day(1), "slr", true).unwrap();
        let outcome = commit_day(&mut state, &rules, day(1));
        assert_eq!(outcome.points_added, 10);
        assert_eq!(state.total_points, 75);
        assert_eq!(state.days_completed, 1);
    }

    #[test]
    fn commit_below_target_adds_points_only() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), &["walk20", "water2l"]);

        let outcome = commit_day(&mut state, &rules, day(1));
        assert!(!outcome.met_target);
        assert!(!outcome.newly_counted);
        assert_eq!(state.total_points, 25);
        assert_eq!(state.days_completed, 0);
        assert_eq!(state.week_progress, 0);
        assert!(!state.record(day(1)).unwrap().counted);
    }

    #[test]
    fn unchecking_after_commit_never_lowers_total() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), SIXTY_FIVE);
        commit_day(&mut state, &rules, day(1));

        set_checked(&mut state, &rules, day(1), "walk20", false).unwrap();
        let outcome = commit_day(&mut state, &rules, day(1));
        assert_eq!(outcome.points_added, 0);
        assert_eq!(state.total_points, 65);
        // the day stays counted even though it now scores 50
        assert!(state.record(day(1)).unwrap().counted);
    }

    #[test]
    fn seven_days_promote_to_level_two() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        for n in 1..=7 {
            check_all(&mut state, &rules, day(n), SIXTY_FIVE);
            let outcome = commit_day(&mut state, &rules, day(n));
            if n < 7 {
                assert!(outcome.promotion.is_none());
                assert_eq!(state.week_progress, n);
            } else {
                assert_eq!(outcome.promotion, Some(Promotion { from: 1, to: 2 }));
            }
        }
        assert_eq!(state.level, 2);
        assert_eq!(state.week_progress, 0);
        assert_eq!(state.days_completed, 7);
        assert_eq!(state.total_points, 7 * 65);
    }

    #[test]
    fn promotion_is_single_step_and_drops_excess() {
        let rules = LevelRules::new(vec![LevelRule::new(10, 2), LevelRule::new(10, 2)]).unwrap();
        let mut state = ProgressState {
            week_progress: 5,
            ..Default::default()
        };
        check_all(&mut state, &rules, day(1), &["walk20"]);
        let outcome = commit_day(&mut state, &rules, day(1));
        assert_eq!(outcome.promotion, Some(Promotion { from: 1, to: 2 }));
        assert_eq!(state.level, 2);
        assert_eq!(state.week_progress, 0);
    }

    #[test]
    fn cycle_invariant_holds_after_every_commit() {
        let rules = LevelRules::new(vec![
            LevelRule::new(20, 1),
            LevelRule::new(30, 2),
            LevelRule::new(40, 3),
        ])
        .unwrap();
        let mut state = ProgressState::default();
        for n in 1..=28 {
            let ids: &[&str] = if n % 4 == 0 { &["water2l"] } else { SIXTY_FIVE };
            check_all(&mut state, &rules, day(n), ids);
            commit_day(&mut state, &rules, day(n));
            commit_day(&mut state, &rules, day(n));
            assert!(state.week_progress < rules.days_needed(state.level));
        }
        assert!(state.level > 3);
    }

    #[test]
    fn met_target_is_fixed_at_commit() {
        let rules = LevelRules::new(vec![LevelRule::new(60, 1), LevelRule::new(100, 1)]).unwrap();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), SIXTY_FIVE);
        commit_day(&mut state, &rules, day(1));
        assert_eq!(state.level, 2);

        // a later day under the harder rule does not rewrite day 1
        check_all(&mut state, &rules, day(2), SIXTY_FIVE);
        commit_day(&mut state, &rules, day(2));
        assert!(state.record(day(1)).unwrap().met_target);
        assert!(!state.record(day(2)).unwrap().met_target);
    }

    #[test]
    fn reset_clears_today_only() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), SIXTY_FIVE);
        commit_day(&mut state, &rules, day(1));

        check_all(&mut state, &rules, day(2), &["walk20", "slr", "step_up"]);
        reset_today(&mut state, day(2));

        let rec = state.record(day(2)).unwrap();
        assert!(rec.checked.is_empty());
        assert!(!rec.met_target);
        assert_eq!(rec.points, 0);
        assert_eq!(state.total_points, 65);
        assert_eq!(state.days_completed, 1);
        assert_eq!(state.week_progress, 1);
        assert_eq!(state.record(day(1)).unwrap().points, 65);
    }

    #[test]
    fn reset_keeps_accrual_ledger() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), SIXTY_FIVE);
        commit_day(&mut state, &rules, day(1));
        reset_today(&mut state, day(1));
        assert!(!state.record(day(1)).unwrap().counted);

        check_all(&mut state, &rules, day(1), SIXTY_FIVE);
        let outcome = commit_day(&mut state, &rules, day(1));
        assert_eq!(outcome.points_added, 0);
        assert_eq!(state.total_points, 65);
    }

    #[test]
    fn refresh_is_idempotent() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), SEVENTY_FIVE);
        let first = refresh_today(&mut state, &rules, day(1)).clone();
        let second = refresh_today(&mut state, &rules, day(1)).clone();
        assert_eq!(first, second);
        assert_eq!(first.points, 75);
        assert_eq!(state.total_points, 0);
    }

    #[test]
    fn summary_reports_cycle() {
        let rules = LevelRules::default();
        let mut state = ProgressState::default();
        check_all(&mut state, &rules, day(1), SIXTY_FIVE);
        commit_day(&mut state, &rules, day(1));

        let s = summary(&state, &rules, day(1));
        assert_eq!(s.level, 1);
        assert_eq!(s.daily_min_points, 60);
        assert_eq!(s.days_needed, 7);
        assert_eq!(s.week_progress, 1);
        assert!((s.cycle_ratio - 1.0 / 7.0).abs() < 1e-9);
        assert!(s.today_met_target);
        assert!(s.today_counted);

        let empty = summary(&state, &rules, day(2));
        assert_eq!(empty.today_points, 0);
        assert!(!empty.today_met_target);
    }

    #[test]
    fn normalize_lifts_level_zero() {
        let rules = LevelRules::default();
        let mut state = ProgressState {
            level: 0,
            ..Default::default()
        };
        assert!(normalize(&mut state, &rules));
        assert_eq!(state.level, 1);
        assert_eq!(summary(&state, &rules, day(1)).level, 1);
    }

    #[test]
    fn normalize_clamps_progress_after_rules_shrink() {
        let rules = LevelRules::new(vec![LevelRule::new(60, 3)]).unwrap();
        let mut state = ProgressState {
            week_progress: 5,
            ..Default::default()
        };
        assert!(normalize(&mut state, &rules));
        assert_eq!(state.week_progress, 2);

        let s = summary(&state, &rules, day(1));
        assert!(s.week_progress < s.days_needed);

        // the next counted day completes the cycle
        check_all(&mut state, &rules, day(1), SIXTY_FIVE);
        let outcome = commit_day(&mut state, &rules, day(1));
        assert_eq!(outcome.promotion, Some(Promotion { from: 1, to: 2 }));
        assert_eq!(state.week_progress, 0);
    }

    #[test]
    fn normalize_leaves_valid_state_alone() {
        let rules = LevelRules::default();
        let mut state = ProgressState {
            level: 3,
            week_progress: 6,
            ..Default::default()
        };
        let before = state.clone();
        assert!(!normalize(&mut state, &rules));
        assert_eq!(state, before);
    }

    #[test]
    fn recent_history_is_newest_first_and_limited() {
        let mut state = ProgressState::default();
        for n in 1..=10 {
            ensure_day(&mut state, day(n));
        }
        let recent = recent_history(&state, 3);
        let dates: Vec<NaiveDate> = recent.iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![day(10), day(9), day(8)]);
        assert_eq!(recent_history(&state, 30).len(), 10);
    }
}
