use std::fs;
use std::path::{Path, PathBuf};

use crate::io::store_io::{FileStore, SEQUENCE_KEY, StoreError, TASKS_KEY};

/// Name of the per-workspace data directory
pub const DATA_DIR: &str = ".cadence";

const CONFIG_TEMPLATE: &str = r#"# cadence workspace configuration

[tasks]
# Prefix for task IDs (T-001, T-002, ...)
id_prefix = "T"
# What `add` does when a one-off task reuses a name: merge | reject | keep
on_duplicate = "merge"
default_priority = "Medium"

[watch]
# Countdown refresh interval
tick_ms = 1000
"#;

/// A discovered workspace: the directory holding `.cadence/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: PathBuf,
    pub data_dir: PathBuf,
}

impl Workspace {
    pub fn at(root: &Path) -> Self {
        Workspace {
            root: root.to_path_buf(),
            data_dir: root.join(DATA_DIR),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.store().path_for(TASKS_KEY)
    }
}

/// Walk up from `start` looking for a `.cadence/` directory
pub fn discover_workspace(start: &Path) -> Result<Workspace, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(DATA_DIR).is_dir() {
            return Ok(Workspace::at(&current));
        }
        if !current.pop() {
            return Err(StoreError::NotAWorkspace);
        }
    }
}

/// Create `.cadence/` with a default config and an empty task list.
/// Existing files are only replaced when `force` is set.
pub fn init_workspace(root: &Path, force: bool) -> Result<Workspace, Box<dyn std::error::Error>> {
    let ws = Workspace::at(root);
    if ws.data_dir.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to reinitialize)",
            ws.data_dir.display()
        )
        .into());
    }
    fs::create_dir_all(&ws.data_dir)?;
    fs::write(ws.config_path(), CONFIG_TEMPLATE)?;
    if force || !ws.tasks_path().exists() {
        fs::write(ws.tasks_path(), "[]\n")?;
        // A fresh task list starts numbering over
        let sequence = ws.store().path_for(SEQUENCE_KEY);
        if sequence.exists() {
            fs::remove_file(sequence)?;
        }
    }
    tracing::info!(root = %root.display(), "initialized workspace");
    Ok(ws)
}
