use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches the task file for writes made by other processes (usually the CLI).
pub struct TaskFileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

impl TaskFileWatcher {
    /// Watch `data_dir` for changes to `tasks_file`.
    pub fn start(data_dir: &Path, tasks_file: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let target: PathBuf = tasks_file.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                // Atomic saves rename a temp file over the target, so match by name
                let touches_target = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == target.file_name());
                if touches_target {
                    let _ = tx.send(());
                }
            },
            Config::default(),
        )?;

        // Non-recursive: the temp files live next to the target
        watcher.watch(data_dir, RecursiveMode::NonRecursive)?;
        Ok(TaskFileWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drain pending notifications; true if the file changed since the last poll.
    pub fn changed(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}
