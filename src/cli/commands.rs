use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lu",
    about = concat!("levelup v", env!("CARGO_PKG_VERSION"), " - daily habits, points and levels"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory holding state.json and config.toml
    #[arg(short = 'C', long = "data-dir", global = true, default_value = ".levelup")]
    pub data_dir: String,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show today's checklist and score (default)
    Today,
    /// List all tasks grouped by category
    Tasks,
    /// Check one or more tasks for today
    Check(TaskIdsArgs),
    /// Uncheck one or more tasks for today
    Uncheck(TaskIdsArgs),
    /// Flip a task's checked state for today
    Toggle(TaskIdArg),
    /// Save today's progress without finishing the day
    Save,
    /// Clear today's checks
    Reset,
    /// Finish the day: apply today's score and check for a level up
    Commit,
    /// Show level and cycle progress
    Status,
    /// Add a custom task
    AddTask(AddTaskArgs),
    /// Show recent days, newest first
    History(HistoryArgs),
    /// Write the state document to a file (or stdout with -)
    Export(ExportArgs),
    /// Show the level table and allowed task points
    Rules,
}

#[derive(Args)]
pub struct TaskIdsArgs {
    /// Task IDs
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct TaskIdArg {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct AddTaskArgs {
    /// Unique task ID (letters, digits, '_' or '-')
    #[arg(long)]
    pub id: String,
    /// Display label
    #[arg(long)]
    pub label: String,
    /// Category to group the task under
    #[arg(long, default_value = "General")]
    pub category: String,
    /// Points awarded when checked (default: 10 if allowed)
    #[arg(long)]
    pub points: Option<u32>,
    /// Instructions shown under the label
    #[arg(long, default_value = "")]
    pub note: String,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Maximum number of days to show (default: history.window from config)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination file, or - for stdout
    #[arg(short, long, default_value = "levelup_state.json")]
    pub output: String,
}
