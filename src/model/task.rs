use serde::{Deserialize, Serialize};

/// Where a task came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSource {
    /// Compiled into the binary, always present
    BuiltIn,
    /// Added by the user at runtime and stored in the state file
    #[default]
    Custom,
}

/// A single checkable daily task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Free-form grouping label (e.g. "Neck", "Sleep")
    pub category: String,
    /// Unique id, referenced from history records
    pub id: String,
    /// Display label
    pub label: String,
    /// Points awarded when checked
    pub points: u32,
    /// Optional instructions shown under the label
    #[serde(default)]
    pub help: String,

    /// Not persisted: everything read from the state file is custom
    #[serde(skip)]
    pub source: TaskSource,
}

impl Task {
    pub fn is_builtin(&self) -> bool {
        self.source == TaskSource::BuiltIn
    }
}

/// Compiled-in task definition
#[derive(Debug, Clone, Copy)]
pub struct BuiltinTask {
    pub category: &'static str,
    pub id: &'static str,
    pub label: &'static str,
    pub points: u32,
    pub help: &'static str,
}

impl BuiltinTask {
    pub fn to_task(self) -> Task {
        Task {
            category: self.category.to_string(),
            id: self.id.to_string(),
            label: self.label.to_string(),
            points: self.points,
            help: self.help.to_string(),
            source: TaskSource::BuiltIn,
        }
    }
}

/// The built-in catalog, in display order.
pub const BUILTIN_TASKS: &[BuiltinTask] = &[
    BuiltinTask {
        category: "Neck",
        id: "chin_tuck",
        label: "Chin tuck (10 reps)",
        points: 10,
        help: "Sit upright. Draw the chin straight back without tilting. Hold 5 s, release. 10 reps.",
    },
    BuiltinTask {
        category: "Neck",
        id: "scap_squeeze",
        label: "Shoulder blade squeeze (10 reps)",
        points: 10,
        help: "Pull the shoulders back and squeeze the shoulder blades together. Hold 5 s, release. 10 reps.",
    },
    BuiltinTask {
        category: "Neck",
        id: "lat_stretch",
        label: "Lateral neck stretch (2x20 s per side)",
        points: 10,
        help: "Tilt the head to the right with light hand support for 20 s, then the left. No pain.",
    },
    BuiltinTask {
        category: "Knee",
        id: "slr",
        label: "Straight leg raise (10 reps per leg)",
        points: 10,
        help: "Lie on your back, one leg straight, the other bent. Raise the straight leg 30 cm, hold 3 s, lower.",
    },
    BuiltinTask {
        category: "Knee",
        id: "wall_sit",
        label: "Wall sit (3x20 s)",
        points: 10,
        help: "Back against the wall, knees at about 45 degrees. 3 sets of 20 s with rest between.",
    },
    BuiltinTask {
        category: "Knee",
        id: "step_up",
        label: "Step-ups (10 reps per leg)",
        points: 10,
        help: "Low step, alternate legs up and down. Stop on any sharp knee pain.",
    },
    BuiltinTask {
        category: "General",
        id: "walk20",
        label: "Walk (at least 20 min)",
        points: 15,
        help: "Brisk pace without straining the knees.",
    },
    BuiltinTask {
        category: "General",
        id: "water2l",
        label: "Water (at least 2 L)",
        points: 10,
        help: "Drink room-temperature water through the day.",
    },
    BuiltinTask {
        category: "General",
        id: "screen_breaks",
        label: "Screen breaks (2 min every hour)",
        points: 10,
        help: "Stand up every hour and walk or stretch for 2 minutes (at least 6 times).",
    },
    BuiltinTask {
        category: "Reflux",
        id: "dinner_before19",
        label: "Dinner before 19:00",
        points: 10,
        help: "Supports the no-lying-down-for-3-hours-after-eating rule.",
    },
    BuiltinTask {
        category: "Sleep",
        id: "sleep_23",
        label: "In bed by 23:00",
        points: 10,
        help: "7 to 8 hours of sleep with the head slightly raised.",
    },
];

/// Built-in tasks as owned values, in declaration order
pub fn builtin_tasks() -> Vec<Task> {
    BUILTIN_TASKS.iter().map(|b| b.to_task()).collect()
}

/// Whether `id` names a built-in task
pub fn is_builtin_id(id: &str) -> bool {
    BUILTIN_TASKS.iter().any(|b| b.id == id)
}
