use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::DataDirLock;
use crate::io::store;
use crate::model::config::Config;
use crate::model::record::DailyRecord;
use crate::model::state::ProgressState;
use crate::ops::catalog::{self, NewTask};
use crate::ops::progress;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs besides the state document
struct Context {
    data_dir: PathBuf,
    config: Config,
    today: NaiveDate,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let data_dir = PathBuf::from(&cli.data_dir);
    let config = config_io::read_config(&data_dir)?;
    let ctx = Context {
        data_dir,
        config,
        today: Local::now().date_naive(),
    };

    match cli.command.unwrap_or(Commands::Today) {
        // Read commands
        Commands::Today => cmd_today(&ctx, json),
        Commands::Tasks => cmd_tasks(&ctx, json),
        Commands::Status => cmd_status(&ctx, json),
        Commands::History(args) => cmd_history(&ctx, args, json),
        Commands::Export(args) => cmd_export(&ctx, args),
        Commands::Rules => cmd_rules(&ctx, json),

        // Write commands
        Commands::Check(args) => cmd_set_checked(&ctx, args, true, json),
        Commands::Uncheck(args) => cmd_set_checked(&ctx, args, false, json),
        Commands::Toggle(args) => cmd_toggle(&ctx, args, json),
        Commands::Save => cmd_save(&ctx, json),
        Commands::Reset => cmd_reset(&ctx, json),
        Commands::Commit => cmd_commit(&ctx, json),
        Commands::AddTask(args) => cmd_add_task(&ctx, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run a read-modify-write against the state document under the data
/// directory lock. Nothing is written if `f` fails.
fn with_state<T>(
    ctx: &Context,
    f: impl FnOnce(&mut ProgressState) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    let _lock = DataDirLock::acquire_default(&ctx.data_dir)?;
    let mut state = store::load_state_for_write(&ctx.data_dir)?;
    progress::normalize(&mut state, &ctx.config.levels);
    let out = f(&mut state)?;
    store::save_state(&ctx.data_dir, &state)?;
    Ok(out)
}

/// Load the state and rescore today in memory, without saving.
fn load_view(ctx: &Context) -> ProgressState {
    let mut state = store::load_state(&ctx.data_dir);
    progress::normalize(&mut state, &ctx.config.levels);
    progress::refresh_today(&mut state, &ctx.config.levels, ctx.today);
    state
}

fn today_record<'a>(state: &'a ProgressState, ctx: &Context) -> &'a DailyRecord {
    static EMPTY: DailyRecord = DailyRecord {
        checked: std::collections::BTreeSet::new(),
        points: 0,
        met_target: false,
        counted: false,
        committed_points: 0,
    };
    state.record(ctx.today).unwrap_or(&EMPTY)
}

fn today_json(state: &ProgressState, ctx: &Context) -> TodayJson {
    let record = today_record(state, ctx);
    let tasks = catalog::list_tasks(state);
    TodayJson {
        date: ctx.today,
        level: state.level,
        points: record.points,
        daily_min_points: ctx.config.levels.daily_min_points(state.level),
        met_target: record.met_target,
        counted: record.counted,
        checked: record.checked.iter().cloned().collect(),
        categories: categories_to_json(&tasks, Some(record)),
    }
}

fn score_line(state: &ProgressState, ctx: &Context) -> String {
    let record = today_record(state, ctx);
    format!(
        "Score: {} / {}  {}",
        record.points,
        ctx.config.levels.daily_min_points(state.level),
        if record.met_target { "target met" } else { "below target" }
    )
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_today(ctx: &Context, json: bool) -> CmdResult {
    let state = load_view(ctx);
    if json {
        println!("{}", serde_json::to_string_pretty(&today_json(&state, ctx))?);
    } else {
        let tasks = catalog::list_tasks(&state);
        let summary = progress::summary(&state, &ctx.config.levels, ctx.today);
        print_lines(&format_today(&tasks, today_record(&state, ctx), &summary));
    }
    Ok(())
}

fn cmd_tasks(ctx: &Context, json: bool) -> CmdResult {
    let state = store::load_state(&ctx.data_dir);
    let tasks = catalog::list_tasks(&state);
    if json {
        println!("{}", serde_json::to_string_pretty(&categories_to_json(&tasks, None))?);
    } else {
        print_lines(&format_task_groups(&tasks, None, true));
    }
    Ok(())
}

fn cmd_status(ctx: &Context, json: bool) -> CmdResult {
    let state = load_view(ctx);
    let summary = progress::summary(&state, &ctx.config.levels, ctx.today);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_lines(&format_status(&summary));
    }
    Ok(())
}

fn cmd_history(ctx: &Context, args: HistoryArgs, json: bool) -> CmdResult {
    let state = store::load_state(&ctx.data_dir);
    let limit = args.limit.unwrap_or(ctx.config.history.window);
    let recent = progress::recent_history(&state, limit);
    if json {
        let entries: Vec<HistoryEntryJson> = recent
            .iter()
            .map(|(date, rec)| history_entry_to_json(*date, rec))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if recent.is_empty() {
        println!("no history yet");
    } else {
        for (date, rec) in recent {
            println!("{}", format_history_line(date, rec));
        }
    }
    Ok(())
}

fn cmd_export(ctx: &Context, args: ExportArgs) -> CmdResult {
    if args.output == "-" {
        let bytes = store::export_bytes(&ctx.data_dir)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
    } else {
        let dest = Path::new(&args.output);
        store::export_state(&ctx.data_dir, dest)?;
        println!("exported to {}", dest.display());
    }
    Ok(())
}

fn cmd_rules(ctx: &Context, json: bool) -> CmdResult {
    if json {
        let rules = rules_to_json(&ctx.config.levels, &ctx.config.points);
        println!("{}", serde_json::to_string_pretty(&rules)?);
    } else {
        print_lines(&format_rules(&ctx.config.levels, &ctx.config.points));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_set_checked(ctx: &Context, args: TaskIdsArgs, checked: bool, json: bool) -> CmdResult {
    let state = with_state(ctx, |state| {
        for id in &args.ids {
            progress::set_checked(state, &ctx.config.levels, ctx.today, id, checked)?;
        }
        Ok(state.clone())
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&today_json(&state, ctx))?);
    } else {
        let verb = if checked { "checked" } else { "unchecked" };
        for id in &args.ids {
            println!("{} {}", verb, id);
        }
        println!("{}", score_line(&state, ctx));
    }
    Ok(())
}

fn cmd_toggle(ctx: &Context, args: TaskIdArg, json: bool) -> CmdResult {
    let (now_checked, state) = with_state(ctx, |state| {
        let now_checked = progress::toggle_task(state, &ctx.config.levels, ctx.today, &args.id)?;
        Ok((now_checked, state.clone()))
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&today_json(&state, ctx))?);
    } else {
        let verb = if now_checked { "checked" } else { "unchecked" };
        println!("{} {}", verb, args.id);
        println!("{}", score_line(&state, ctx));
    }
    Ok(())
}

fn cmd_save(ctx: &Context, json: bool) -> CmdResult {
    let state = with_state(ctx, |state| {
        progress::refresh_today(state, &ctx.config.levels, ctx.today);
        Ok(state.clone())
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&today_json(&state, ctx))?);
    } else {
        println!("saved");
        println!("{}", score_line(&state, ctx));
    }
    Ok(())
}

fn cmd_reset(ctx: &Context, json: bool) -> CmdResult {
    let state = with_state(ctx, |state| {
        progress::reset_today(state, ctx.today);
        Ok(state.clone())
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&today_json(&state, ctx))?);
    } else {
        println!("today cleared");
    }
    Ok(())
}

fn cmd_commit(ctx: &Context, json: bool) -> CmdResult {
    let (outcome, summary) = with_state(ctx, |state| {
        let outcome = progress::commit_day(state, &ctx.config.levels, ctx.today);
        let summary = progress::summary(state, &ctx.config.levels, ctx.today);
        Ok((outcome, summary))
    })?;

    if json {
        let body = serde_json::json!({ "outcome": outcome, "status": summary });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_lines(&format_commit(&outcome, &summary));
    }
    Ok(())
}

fn cmd_add_task(ctx: &Context, args: AddTaskArgs, json: bool) -> CmdResult {
    let policy = ctx.config.points;
    let task = with_state(ctx, |state| {
        let new = NewTask {
            category: args.category,
            id: args.id,
            label: args.label,
            points: args.points.unwrap_or_else(|| policy.suggested()),
            help: args.note,
        };
        Ok(catalog::add_custom_task(state, &policy, new)?.clone())
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(&task, None))?);
    } else {
        println!("{}", task.id);
    }
    Ok(())
}
