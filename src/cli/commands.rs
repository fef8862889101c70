use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cad", about = concat!("cadence v", env!("CARGO_PKG_VERSION"), " - tasks, routines and a countdown"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// Reference clock for countdowns (YYYY-MM-DDTHH:MM[:SS], local time)
    #[arg(long, global = true, value_name = "DATETIME")]
    pub now: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a workspace in the current directory
    Init(InitArgs),
    /// Add a task
    Add(AddArgs),
    /// Change a task's fields
    Edit(EditArgs),
    /// Toggle a task's completion (recurring tasks schedule their next run)
    Done(IdArg),
    /// Delete a task
    Rm(IdArg),
    /// Delete all completed tasks
    Clear,
    /// List tasks in schedule order
    List(ListArgs),
    /// Show task details
    Show(IdArg),
    /// Show the countdown to the next task
    Next,
    /// Show the total duration of all tasks
    Total,
    /// Read or change workspace settings
    Config(ConfigCmd),
    /// Live countdown view (default when no command is given)
    Watch,
}

#[derive(Args)]
pub struct InitArgs {
    /// Reinitialize even if .cadence/ already exists (clears tasks)
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID (e.g. T-001)
    pub id: String,
}

/// Task fields shared by `add` and `edit`
#[derive(Args, Default)]
pub struct TaskFields {
    /// Date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// Start time (HH:MM)
    #[arg(long)]
    pub start: Option<String>,
    /// Duration hours
    #[arg(long, allow_hyphen_values = true)]
    pub hours: Option<i64>,
    /// Duration minutes
    #[arg(long, allow_hyphen_values = true)]
    pub minutes: Option<i64>,
    /// Duration seconds
    #[arg(long, allow_hyphen_values = true)]
    pub seconds: Option<i64>,
    /// Duration as one value (1h30m, 45m, 90s); overrides --hours/--minutes/--seconds
    #[arg(short, long, conflicts_with_all = ["hours", "minutes", "seconds"])]
    pub duration: Option<String>,
    /// Priority (High, Medium, Low)
    #[arg(short, long)]
    pub priority: Option<String>,
    /// Recurrence (None, Daily, Weekly)
    #[arg(short, long)]
    pub repeat: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task name
    pub name: String,
    #[command(flatten)]
    pub fields: TaskFields,
    /// Recur every day, whatever --repeat says
    #[arg(long)]
    pub routine: bool,
    /// What to do if a one-off task with this name exists (merge, reject, keep)
    #[arg(long, value_name = "POLICY")]
    pub on_duplicate: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    #[command(flatten)]
    pub fields: TaskFields,
    /// Set or clear the routine flag
    #[arg(long, value_name = "BOOL")]
    pub routine: Option<bool>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Hide completed tasks
    #[arg(long)]
    pub pending: bool,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a setting (e.g. tasks.on_duplicate)
    Get(ConfigGetArgs),
    /// Change a setting
    Set(ConfigSetArgs),
    /// Print the config file path
    Path,
}

#[derive(Args)]
pub struct ConfigGetArgs {
    /// Setting name as section.key
    pub key: String,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Setting name as section.key
    pub key: String,
    /// New value
    pub value: String,
}
