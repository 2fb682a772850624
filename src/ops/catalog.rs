use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::model::config::PointPolicy;
use crate::model::state::ProgressState;
use crate::model::task::{BUILTIN_TASKS, Task, TaskSource, builtin_tasks, is_builtin_id};

/// Error type for catalog operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid task: {0}")]
    Validation(String),
    #[error("task id already exists: {0}")]
    DuplicateId(String),
}

static TASK_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid task id regex"));

/// Input for a new custom task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub category: String,
    pub id: String,
    pub label: String,
    pub points: u32,
    pub help: String,
}

/// All tasks: built-ins in declaration order, then custom tasks in the
/// order they were added.
pub fn list_tasks(state: &ProgressState) -> Vec<Task> {
    let mut tasks = builtin_tasks();
    tasks.extend(state.custom_tasks.iter().cloned());
    tasks
}

/// Group tasks by category, keeping the order each category first appears in.
pub fn group_by_category(tasks: &[Task]) -> IndexMap<String, Vec<&Task>> {
    let mut groups: IndexMap<String, Vec<&Task>> = IndexMap::new();
    for task in tasks {
        groups.entry(task.category.clone()).or_default().push(task);
    }
    groups
}

/// Look up a task by id across both built-in and custom tasks.
pub fn find_task(state: &ProgressState, id: &str) -> Option<Task> {
    if let Some(b) = BUILTIN_TASKS.iter().find(|b| b.id == id) {
        return Some(b.to_task());
    }
    state.custom_tasks.iter().find(|t| t.id == id).cloned()
}

pub fn id_exists(state: &ProgressState, id: &str) -> bool {
    is_builtin_id(id) || state.custom_tasks.iter().any(|t| t.id == id)
}

/// Append a custom task. Nothing is modified when validation fails.
pub fn add_custom_task<'a>(
    state: &'a mut ProgressState,
    policy: &PointPolicy,
    new: NewTask,
) -> Result<&'a Task, CatalogError> {
    let category = new.category.trim();
    let id = new.id.trim();
    let label = new.label.trim();

    if label.is_empty() {
        return Err(CatalogError::Validation("label cannot be empty".into()));
    }
    if id.is_empty() {
        return Err(CatalogError::Validation("id cannot be empty".into()));
    }
    if category.is_empty() {
        return Err(CatalogError::Validation("category cannot be empty".into()));
    }
    if !TASK_ID_RE.is_match(id) {
        return Err(CatalogError::Validation(format!(
            "invalid id \"{}\": use letters, digits, '_' or '-'",
            id
        )));
    }
    if !policy.allows(new.points) {
        return Err(CatalogError::Validation(format!(
            "points must be between {} and {} in steps of {} (got {})",
            policy.min, policy.max, policy.step, new.points
        )));
    }
    if id_exists(state, id) {
        return Err(CatalogError::DuplicateId(id.to_string()));
    }

    tracing::debug!(id, points = new.points, "adding custom task");
    state.custom_tasks.push(Task {
        category: category.to_string(),
        id: id.to_string(),
        label: label.to_string(),
        points: new.points,
        help: new.help.trim().to_string(),
        source: TaskSource::Custom,
    });
    Ok(&state.custom_tasks[state.custom_tasks.len() - 1])
}
