mod config;

use std::path::Path;

use chrono::{Local, NaiveDateTime};
use serde_json::json;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::WriteLock;
use crate::io::store_io::FileStore;
use crate::io::workspace::{self, Workspace};
use crate::model::config::{Config, DuplicatePolicy};
use crate::model::task::{Priority, Repeat, parse_date, parse_start};
use crate::ops::task_ops::{self, Candidate};
use crate::ops::tracker::{AddOutcome, Submitted, Tracker};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start_dir = match cli.dir.as_deref() {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };
    let now = parse_now(cli.now.as_deref())?;
    let fixed_now = cli.now.is_some().then_some(now);
    let ctx = || Context::open(&start_dir);

    match cli.command.unwrap_or(Commands::Watch) {
        // Init runs before workspace discovery
        Commands::Init(args) => cmd_init(&start_dir, args),
        Commands::Add(args) => cmd_add(&ctx()?, args, json),
        Commands::Edit(args) => cmd_edit(&ctx()?, args),
        Commands::Done(args) => cmd_done(&ctx()?, args, json),
        Commands::Rm(args) => cmd_rm(&ctx()?, args),
        Commands::Clear => cmd_clear(&ctx()?),
        Commands::List(args) => cmd_list(&ctx()?, args, json),
        Commands::Show(args) => cmd_show(&ctx()?, args, json),
        Commands::Next => cmd_next(&ctx()?, now, json),
        Commands::Total => cmd_total(&ctx()?, json),
        Commands::Config(args) => config::cmd_config(&ctx()?, args),
        Commands::Watch => {
            let ctx = ctx()?;
            crate::tui::run(ctx.workspace, ctx.config, fixed_now)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A discovered workspace and its config
pub(crate) struct Context {
    pub workspace: Workspace,
    pub config: Config,
}

impl Context {
    fn open(start: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let workspace = workspace::discover_workspace(start)?;
        let (config, _) = config_io::read_config(&workspace.config_path())?;
        tracing::debug!(root = %workspace.root.display(), "using workspace");
        Ok(Context { workspace, config })
    }

    fn tracker(&self) -> Result<Tracker<FileStore>, Box<dyn std::error::Error>> {
        Ok(Tracker::open(
            self.workspace.store(),
            &self.config.tasks.id_prefix,
        )?)
    }

    fn lock(&self) -> Result<WriteLock, Box<dyn std::error::Error>> {
        Ok(WriteLock::acquire_default(&self.workspace.data_dir)?)
    }
}

/// Parse `--now`, defaulting to the local wall clock
fn parse_now(raw: Option<&str>) -> Result<NaiveDateTime, String> {
    let Some(raw) = raw else {
        return Ok(Local::now().naive_local());
    };
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| format!("invalid --now '{}' (expected YYYY-MM-DDTHH:MM[:SS])", raw))
}

/// Overlay explicitly given fields onto a candidate
fn apply_fields(candidate: &mut Candidate, fields: &TaskFields) -> Result<(), String> {
    if let Some(ref date) = fields.date {
        candidate.date =
            Some(parse_date(date).ok_or_else(|| format!("invalid date '{}' (expected YYYY-MM-DD)", date))?);
    }
    if let Some(ref start) = fields.start {
        candidate.start =
            Some(parse_start(start).ok_or_else(|| format!("invalid start time '{}' (expected HH:MM)", start))?);
    }
    if let Some(ref duration) = fields.duration {
        let total = task_ops::parse_duration(duration).map_err(|e| e.to_string())?;
        candidate.set_duration(total);
    } else {
        if let Some(h) = fields.hours {
            candidate.hours = h;
        }
        if let Some(m) = fields.minutes {
            candidate.minutes = m;
        }
        if let Some(s) = fields.seconds {
            candidate.seconds = s;
        }
    }
    if let Some(ref priority) = fields.priority {
        candidate.priority = priority.parse::<Priority>()?;
    }
    if let Some(ref repeat) = fields.repeat {
        candidate.repeat = repeat.parse::<Repeat>()?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

fn cmd_init(start: &Path, args: InitArgs) -> CmdResult {
    let ws = workspace::init_workspace(start, args.force)?;
    println!("initialized {}", ws.data_dir.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs, json: bool) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut tracker = ctx.tracker()?;

    let mut candidate = Candidate {
        name: args.name,
        priority: ctx.config.tasks.default_priority,
        routine: args.routine,
        ..Default::default()
    };
    apply_fields(&mut candidate, &args.fields)?;

    let policy = match args.on_duplicate.as_deref() {
        Some(p) => p.parse::<DuplicatePolicy>()?,
        None => ctx.config.tasks.on_duplicate,
    };

    let outcome = tracker.add(&candidate, policy)?;
    let kind = match &outcome {
        AddOutcome::Added(_) => "added",
        AddOutcome::Merged(id) => {
            eprintln!("updated existing task {}", id);
            "merged"
        }
        AddOutcome::Skipped(id) => {
            eprintln!(
                "task \"{}\" already exists as {}; not added",
                candidate.name.trim(),
                id
            );
            "skipped"
        }
    };
    if json {
        println!("{}", json!({ "id": outcome.id(), "outcome": kind }));
    } else if !matches!(outcome, AddOutcome::Skipped(_)) {
        println!("{}", outcome.id());
    }
    Ok(())
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut tracker = ctx.tracker()?;

    let mut form = tracker.begin_edit(&args.id)?;
    if let Some(name) = args.name {
        form.name = name;
    }
    apply_fields(&mut form, &args.fields)?;
    if let Some(routine) = args.routine {
        form.routine = routine;
    }

    match tracker.submit(&form, ctx.config.tasks.on_duplicate)? {
        Submitted::Updated(id) => println!("{}", id),
        Submitted::Added(outcome) => println!("{}", outcome.id()),
    }
    Ok(())
}

fn cmd_done(ctx: &Context, args: IdArg, json: bool) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut tracker = ctx.tracker()?;
    let toggled = tracker.toggle_complete(&args.id)?;

    if json {
        println!(
            "{}",
            json!({
                "id": args.id,
                "completed": toggled.completed,
                "successor": toggled.successor,
            })
        );
        return Ok(());
    }
    let state = if toggled.completed { "completed" } else { "reopened" };
    println!("{} {}", args.id, state);
    if let Some(next) = toggled.successor
        && let Some(task) = tracker.get(&next)
    {
        println!("next: {} on {} {}", next, task.date, task.start.format("%H:%M"));
    }
    Ok(())
}

fn cmd_rm(ctx: &Context, args: IdArg) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut tracker = ctx.tracker()?;
    let removed = tracker.delete(&args.id)?;
    println!("deleted {} {}", removed.id, removed.name);
    Ok(())
}

fn cmd_clear(ctx: &Context) -> CmdResult {
    let _lock = ctx.lock()?;
    let mut tracker = ctx.tracker()?;
    let removed = tracker.clear_completed()?;
    println!("removed {} completed task{}", removed, if removed == 1 { "" } else { "s" });
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs, json: bool) -> CmdResult {
    let tracker = ctx.tracker()?;
    let next_id = tracker.next_active().task().map(|t| t.id.clone());
    let ordered: Vec<_> = tracker
        .ordered()
        .into_iter()
        .filter(|t| !args.pending || !t.completed)
        .collect();

    if json {
        let items: Vec<_> = ordered
            .iter()
            .map(|t| task_to_json(t, next_id.as_deref()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if ordered.is_empty() {
        println!("no tasks");
    } else {
        for line in format_task_list(&ordered, next_id.as_deref()) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_show(ctx: &Context, args: IdArg, json: bool) -> CmdResult {
    let tracker = ctx.tracker()?;
    let task = tracker
        .get(&args.id)
        .ok_or_else(|| format!("task not found: {}", args.id))?;
    if json {
        let next_id = tracker.next_active().task().map(|t| t.id.as_str());
        println!("{}", serde_json::to_string_pretty(&task_to_json(task, next_id))?);
    } else {
        for line in format_task_detail(task) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_next(ctx: &Context, now: NaiveDateTime, json: bool) -> CmdResult {
    let tracker = ctx.tracker()?;
    let countdown = tracker.countdown(now);
    if json {
        println!("{}", serde_json::to_string_pretty(&countdown_to_json(&countdown))?);
    } else {
        println!("{}", countdown);
        if countdown.progress() > 0.0 {
            println!("progress: {:.1}%", countdown.progress());
        }
    }
    Ok(())
}

fn cmd_total(ctx: &Context, json: bool) -> CmdResult {
    let tracker = ctx.tracker()?;
    let total = tracker.total_duration();
    let formatted = crate::ops::countdown::format_duration(total);
    if json {
        let out = TotalJson {
            total_seconds: total,
            formatted,
            count: tracker.tasks().len(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", formatted);
    }
    Ok(())
}
