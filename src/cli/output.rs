use chrono::NaiveDate;
use serde::Serialize;

use crate::model::config::PointPolicy;
use crate::model::level::LevelRules;
use crate::model::record::DailyRecord;
use crate::model::task::Task;
use crate::ops::catalog::group_by_category;
use crate::ops::progress::{CommitOutcome, ProgressSummary};
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

/// Widest label shown in checklist rows before truncation
const LABEL_CELLS: usize = 44;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub category: String,
    pub id: String,
    pub label: String,
    pub points: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub help: String,
    pub builtin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

#[derive(Serialize)]
pub struct CategoryJson {
    pub category: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct TodayJson {
    pub date: NaiveDate,
    pub level: u32,
    pub points: u32,
    pub daily_min_points: u32,
    pub met_target: bool,
    pub counted: bool,
    pub checked: Vec<String>,
    pub categories: Vec<CategoryJson>,
}

#[derive(Serialize)]
pub struct HistoryEntryJson {
    pub date: NaiveDate,
    pub points: u32,
    pub met_target: bool,
    pub counted: bool,
    pub checked: Vec<String>,
}

#[derive(Serialize)]
pub struct LevelRuleJson {
    pub level: u32,
    pub daily_min_points: u32,
    pub days_to_promote: u32,
}

#[derive(Serialize)]
pub struct RulesJson {
    pub levels: Vec<LevelRuleJson>,
    /// Rule applied to every level past the table
    pub beyond: LevelRuleJson,
    pub points: PointPolicy,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task, record: Option<&DailyRecord>) -> TaskJson {
    TaskJson {
        category: task.category.clone(),
        id: task.id.clone(),
        label: task.label.clone(),
        points: task.points,
        help: task.help.clone(),
        builtin: task.is_builtin(),
        checked: record.map(|r| r.is_checked(&task.id)),
    }
}

pub fn categories_to_json(tasks: &[Task], record: Option<&DailyRecord>) -> Vec<CategoryJson> {
    group_by_category(tasks)
        .into_iter()
        .map(|(category, tasks)| CategoryJson {
            category,
            tasks: tasks.into_iter().map(|t| task_to_json(t, record)).collect(),
        })
        .collect()
}

pub fn history_entry_to_json(date: NaiveDate, record: &DailyRecord) -> HistoryEntryJson {
    HistoryEntryJson {
        date,
        points: record.points,
        met_target: record.met_target,
        counted: record.counted,
        checked: record.checked.iter().cloned().collect(),
    }
}

pub fn rules_to_json(rules: &LevelRules, policy: &PointPolicy) -> RulesJson {
    let levels: Vec<LevelRuleJson> = rules
        .iter()
        .enumerate()
        .map(|(i, r)| LevelRuleJson {
            level: i as u32 + 1,
            daily_min_points: r.daily_min_points,
            days_to_promote: r.days_to_promote,
        })
        .collect();
    let next = rules.len() as u32 + 1;
    let beyond = rules.for_level(next);
    RulesJson {
        levels,
        beyond: LevelRuleJson {
            level: next,
            daily_min_points: beyond.daily_min_points,
            days_to_promote: beyond.days_to_promote,
        },
        points: *policy,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn id_column_width(tasks: &[Task]) -> usize {
    tasks.iter().map(|t| display_width(&t.id)).max().unwrap_or(0)
}

/// One task row. With a record, the row starts with a checkbox.
pub fn format_task_line(task: &Task, record: Option<&DailyRecord>, id_cells: usize) -> String {
    let label = pad_to_width(&truncate_to_width(&task.label, LABEL_CELLS), LABEL_CELLS);
    let row = format!(
        "{}  {}  {:>3} pts",
        pad_to_width(&task.id, id_cells),
        label,
        task.points
    );
    match record {
        Some(r) => format!("{} {}", checkbox(r.is_checked(&task.id)), row),
        None => row,
    }
}

/// Tasks grouped under category headings.
pub fn format_task_groups(
    tasks: &[Task],
    record: Option<&DailyRecord>,
    with_help: bool,
) -> Vec<String> {
    let id_cells = id_column_width(tasks);
    let mut lines = Vec::new();
    for (i, (category, group)) in group_by_category(tasks).into_iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(category);
        for task in group {
            lines.push(format!("  {}", format_task_line(task, record, id_cells)));
            if with_help && !task.help.is_empty() {
                lines.push(format!("      {}", task.help));
            }
        }
    }
    lines
}

pub fn format_today(
    tasks: &[Task],
    record: &DailyRecord,
    summary: &ProgressSummary,
) -> Vec<String> {
    let mut lines = vec![format!("{}  level {}", summary.today, summary.level), String::new()];
    lines.extend(format_task_groups(tasks, Some(record), false));
    lines.push(String::new());
    lines.push(format!(
        "Score: {} / {}  {}",
        record.points,
        summary.daily_min_points,
        target_status(record.met_target)
    ));
    lines
}

fn target_status(met: bool) -> &'static str {
    if met { "target met" } else { "below target" }
}

/// `[###-------]` with `width` cells inside the brackets
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn format_status(summary: &ProgressSummary) -> Vec<String> {
    let mut today = format!(
        "Today:          {} points, {}",
        summary.today_points,
        target_status(summary.today_met_target)
    );
    if summary.today_counted {
        today.push_str(", counted");
    }
    vec![
        format!("Level:          {}", summary.level),
        format!(
            "Cycle:          {}/{} {}",
            summary.week_progress,
            summary.days_needed,
            progress_bar(summary.cycle_ratio, 14)
        ),
        format!("Daily target:   {} points", summary.daily_min_points),
        format!("Total points:   {}", summary.total_points),
        format!("Days completed: {}", summary.days_completed),
        today,
    ]
}

pub fn format_history_line(date: NaiveDate, record: &DailyRecord) -> String {
    let icon = if record.met_target { "\u{2713}" } else { "\u{2022}" };
    let checked: Vec<&str> = record.checked.iter().map(|s| s.as_str()).collect();
    format!("{} {}  {:>3} pts  {}", icon, date, record.points, checked.join(", "))
        .trim_end()
        .to_string()
}

pub fn format_commit(outcome: &CommitOutcome, summary: &ProgressSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {} points, {} (+{} total)",
        outcome.date,
        outcome.points,
        target_status(outcome.met_target),
        outcome.points_added
    )];
    if outcome.newly_counted {
        lines.push(format!(
            "Counted toward cycle: {}/{}",
            summary.week_progress, summary.days_needed
        ));
    }
    match outcome.promotion {
        Some(p) => lines.push(format!("Level up! {} -> {}", p.from, p.to)),
        None => lines.push("Day finished. Progress saved.".to_string()),
    }
    lines
}

pub fn format_rules(rules: &LevelRules, policy: &PointPolicy) -> Vec<String> {
    let json = rules_to_json(rules, policy);
    let mut lines = vec!["Level  Daily min  Days to promote".to_string()];
    for r in &json.levels {
        lines.push(format!("{:>5}  {:>9}  {:>15}", r.level, r.daily_min_points, r.days_to_promote));
    }
    lines.push(format!(
        "{:>4}+  {:>9}  {:>15}",
        json.beyond.level, json.beyond.daily_min_points, json.beyond.days_to_promote
    ));
    lines.push(String::new());
    lines.push(format!(
        "Custom task points: {}..={} in steps of {}",
        policy.min, policy.max, policy.step
    ));
    lines
}
