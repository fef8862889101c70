use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::lock::WriteLock;
use crate::io::store_io::{FileStore, KeyValueStore};
use crate::io::watcher::TaskFileWatcher;
use crate::io::workspace::Workspace;
use crate::model::config::Config;
use crate::ops::tracker::{TaskError, Tracker};

use super::render;
use super::theme::Theme;

/// State of the live view
pub struct App<S: KeyValueStore> {
    pub tracker: Tracker<S>,
    pub theme: Theme,
    /// Row in the schedule-ordered list
    pub cursor: usize,
    /// One-line feedback from the last action, shown until the next key
    pub message: Option<String>,
    pub should_quit: bool,
    /// Frozen clock, when started with `--now`
    pub fixed_now: Option<NaiveDateTime>,
    /// Directory to lock around writes; `None` when nothing else can write
    lock_dir: Option<PathBuf>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(tracker: Tracker<S>, theme: Theme) -> Self {
        App {
            tracker,
            theme,
            cursor: 0,
            message: None,
            should_quit: false,
            fixed_now: None,
            lock_dir: None,
        }
    }

    pub fn with_lock_dir(mut self, dir: PathBuf) -> Self {
        self.lock_dir = Some(dir);
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        self.fixed_now
            .unwrap_or_else(|| Local::now().naive_local())
    }

    /// ID of the task under the cursor
    pub fn selected_id(&self) -> Option<String> {
        self.tracker
            .ordered()
            .get(self.cursor)
            .map(|t| t.id.clone())
    }

    fn clamp_cursor(&mut self) {
        let len = self.tracker.tasks().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Re-read the task file (after an external write)
    pub fn reload(&mut self) {
        if let Err(e) = self.tracker.reload() {
            self.message = Some(format!("reload failed: {}", e));
        }
        self.clamp_cursor();
    }

    /// Apply `op` to the task under the cursor and show its result.
    /// The cursor is resolved to an ID first.
    fn write_selected<F>(&mut self, op: F)
    where
        F: FnOnce(&mut Tracker<S>, &str) -> Result<String, TaskError>,
    {
        let Some(id) = self.selected_id() else {
            return;
        };
        self.message = Some(match self.locked_write(&id, op) {
            Ok(msg) => msg,
            Err(e) => format!("error: {}", e),
        });
        self.clamp_cursor();
    }

    /// Run a mutation under the write lock against freshly loaded tasks
    fn locked_write<F>(&mut self, id: &str, op: F) -> Result<String, Box<dyn std::error::Error>>
    where
        F: FnOnce(&mut Tracker<S>, &str) -> Result<String, TaskError>,
    {
        let _lock = match &self.lock_dir {
            Some(dir) => Some(WriteLock::acquire_default(dir)?),
            None => None,
        };
        self.tracker.reload()?;
        Ok(op(&mut self.tracker, id)?)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.message = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor += 1;
                self.clamp_cursor();
            }
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Home | KeyCode::Char('g') => self.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.cursor = usize::MAX;
                self.clamp_cursor();
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => self.write_selected(|tracker, id| {
                let toggled = tracker.toggle_complete(id)?;
                Ok(match (toggled.completed, toggled.successor) {
                    (true, Some(next)) => format!("{} completed, next run is {}", id, next),
                    (true, None) => format!("{} completed", id),
                    (false, _) => format!("{} reopened", id),
                })
            }),
            KeyCode::Char('d') | KeyCode::Delete => self.write_selected(|tracker, id| {
                let removed = tracker.delete(id)?;
                Ok(format!("deleted {} {}", removed.id, removed.name))
            }),
            KeyCode::Char('r') => {
                self.reload();
                if self.message.is_none() {
                    self.message = Some("reloaded".to_string());
                }
            }
            _ => {}
        }
    }
}

/// Run the live view until the user quits
pub fn run(
    workspace: Workspace,
    config: Config,
    fixed_now: Option<NaiveDateTime>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = Tracker::open(workspace.store(), &config.tasks.id_prefix)?;
    let mut app = App::new(tracker, Theme::from_config(&config.ui))
        .with_lock_dir(workspace.data_dir.clone());
    app.fixed_now = fixed_now;

    // Without a watcher the view still works; `r` reloads by hand
    let watcher = TaskFileWatcher::start(&workspace.data_dir, &workspace.tasks_path()).ok();
    let tick = Duration::from_millis(config.watch.tick_ms.max(50));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref(), tick);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<FileStore>,
    watcher: Option<&TaskFileWatcher>,
    tick: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let now = app.now();
        terminal.draw(|frame| render::render(frame, app, now))?;

        // A key or the tick timeout, whichever comes first, triggers a redraw
        if event::poll(tick)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key);
        }

        if watcher.is_some_and(|w| w.changed()) {
            tracing::debug!("task file changed on disk");
            app.reload();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store_io::{MemoryStore, TASKS_KEY, load_tasks};

    fn app() -> App<MemoryStore> {
        let store = MemoryStore::new();
        store
            .save(
                TASKS_KEY,
                r#"[
  {"id":"T-001","name":"Later","date":"2024-01-01","start":"10:00","durationSeconds":600,"priority":"Low","repeat":"None","routine":false,"completed":false},
  {"id":"T-002","name":"Stretch","date":"2024-01-01","start":"07:00","durationSeconds":300,"priority":"High","repeat":"Daily","routine":false,"completed":false}
]"#,
            )
            .unwrap();
        App::new(Tracker::open(store, "T").unwrap(), Theme::default())
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn cursor_follows_schedule_order() {
        let mut app = app();
        assert_eq!(app.selected_id().as_deref(), Some("T-002"));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_id().as_deref(), Some("T-001"));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.cursor, 1);
        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn toggle_selected_recurring_task() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(
            app.message.as_deref(),
            Some("T-002 completed, next run is T-003")
        );
        let saved = load_tasks(app.tracker.store()).unwrap();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved[2].date.to_string(), "2024-01-02");
    }

    #[test]
    fn delete_selected() {
        let mut app = app();
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.message.as_deref(), Some("deleted T-001 Later"));
        assert_eq!(app.tracker.tasks().len(), 1);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn writes_see_external_changes() {
        let mut app = app();
        // Another process removed T-002 behind our back
        app.tracker
            .store()
            .save(
                TASKS_KEY,
                r#"[{"id":"T-001","name":"Later","date":"2024-01-01","start":"10:00","durationSeconds":600}]"#,
            )
            .unwrap();
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.message.as_deref(), Some("error: task not found: T-002"));
        assert_eq!(app.tracker.tasks().len(), 1);
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
