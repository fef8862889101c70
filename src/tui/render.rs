use chrono::NaiveDateTime;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Gauge, Paragraph};

use crate::io::store_io::KeyValueStore;
use crate::model::task::{Repeat, Task};
use crate::ops::countdown::{Countdown, format_duration};

use super::app::App;

const KEY_HINTS: &str = "j/k move  space done  d delete  r reload  q quit";

/// Main render function: header | task list | progress gauge | status row
pub fn render<S: KeyValueStore>(frame: &mut Frame, app: &App<S>, now: NaiveDateTime) {
    let area = frame.area();
    let bg = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header + separator
            Constraint::Min(1),    // task list
            Constraint::Length(1), // gauge
            Constraint::Length(1), // status row
        ])
        .split(area);

    let countdown = app.tracker.countdown(now);
    render_header(frame, app, now, chunks[0]);
    render_task_list(frame, app, &countdown, chunks[1]);
    render_gauge(frame, app, &countdown, chunks[2]);
    render_status_row(frame, app, &countdown, chunks[3]);
}

fn render_header<S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<S>,
    now: NaiveDateTime,
    area: Rect,
) {
    let theme = &app.theme;
    let tasks = app.tracker.tasks();
    let pending = tasks.iter().filter(|t| !t.completed).count();
    let lines = vec![
        Line::from(vec![
            Span::styled(
                " cadence ",
                Style::default()
                    .fg(theme.text_bright)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    " {} pending / {} total  \u{2211} {}  {}",
                    pending,
                    tasks.len(),
                    format_duration(app.tracker.total_duration()),
                    now.format("%Y-%m-%d %H:%M:%S"),
                ),
                Style::default().fg(theme.dim),
            ),
        ]),
        Line::from(Span::styled(
            "\u{2500}".repeat(area.width as usize),
            Style::default().fg(theme.dim),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(theme.background)),
        area,
    );
}

/// Badge after the task name: routine wins over the repeat rule
fn badge(task: &Task) -> Option<&'static str> {
    if task.routine {
        Some("Routine")
    } else {
        match task.repeat {
            Repeat::None => None,
            Repeat::Daily => Some("Daily"),
            Repeat::Weekly => Some("Weekly"),
        }
    }
}

fn render_task_list<S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<S>,
    countdown: &Countdown<'_>,
    area: Rect,
) {
    let theme = &app.theme;
    let ordered = app.tracker.ordered();
    let next_id = countdown.task().map(|t| t.id.as_str());

    if ordered.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  No tasks yet. Add one with `cad add`.",
            Style::default().fg(theme.dim),
        )));
        frame.render_widget(empty, area);
        return;
    }

    // Keep the cursor row on screen
    let height = area.height as usize;
    let scroll = app.cursor.saturating_sub(height.saturating_sub(1));

    let lines: Vec<Line> = ordered
        .iter()
        .enumerate()
        .skip(scroll)
        .take(height)
        .map(|(i, task)| {
            let is_next = next_id == Some(task.id.as_str());
            let selected = i == app.cursor;

            let mut name_style = Style::default().fg(if is_next {
                theme.highlight
            } else {
                theme.text
            });
            if task.completed {
                name_style = name_style
                    .fg(theme.dim)
                    .add_modifier(Modifier::CROSSED_OUT);
            }
            if is_next {
                name_style = name_style.add_modifier(Modifier::BOLD);
            }

            let mut spans = vec![
                Span::styled(
                    if is_next { "\u{25B6} " } else { "  " },
                    Style::default().fg(theme.highlight),
                ),
                Span::styled(
                    if task.completed { "[x] " } else { "[ ] " },
                    Style::default().fg(theme.dim),
                ),
                Span::styled(format!("{} ", task.id), Style::default().fg(theme.dim)),
                Span::styled(task.name.clone(), name_style),
                Span::styled(
                    format!("  {}", task.priority),
                    Style::default().fg(theme.priority_color(task.priority)),
                ),
                Span::styled(
                    format!(
                        "  {} {}  {}",
                        task.date,
                        task.start.format("%H:%M"),
                        format_duration(u64::from(task.duration_seconds))
                    ),
                    Style::default().fg(theme.dim),
                ),
            ];
            if let Some(label) = badge(task) {
                spans.push(Span::styled(
                    format!("  [{}]", label),
                    Style::default().fg(theme.routine),
                ));
            }

            let line = Line::from(spans);
            if selected {
                line.style(Style::default().bg(theme.selection_bg))
            } else {
                line
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_gauge<S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<S>,
    countdown: &Countdown<'_>,
    area: Rect,
) {
    let percent = countdown.progress().clamp(0.0, 100.0);
    let label = match countdown.task() {
        Some(task) => format!("{} {:.0}%", task.name, percent),
        None => String::new(),
    };
    let gauge = Gauge::default()
        .gauge_style(
            Style::default()
                .fg(app.theme.gauge)
                .bg(app.theme.background),
        )
        .ratio(percent / 100.0)
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_status_row<S: KeyValueStore>(
    frame: &mut Frame,
    app: &App<S>,
    countdown: &Countdown<'_>,
    area: Rect,
) {
    let theme = &app.theme;
    let width = area.width as usize;
    let text = app
        .message
        .clone()
        .unwrap_or_else(|| countdown.to_string());

    let mut spans = vec![Span::styled(
        format!(" {}", text),
        Style::default().fg(theme.text_bright),
    )];
    let content_width = text.chars().count() + 1;
    let hint_width = KEY_HINTS.chars().count();
    if content_width + hint_width + 1 < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(KEY_HINTS, Style::default().fg(theme.dim)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.background)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store_io::{MemoryStore, TASKS_KEY};
    use crate::ops::tracker::Tracker;
    use crate::tui::theme::Theme;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Render into an in-memory buffer and return plain text (no styles).
    fn render_to_string(app: &App<MemoryStore>, now: NaiveDateTime, w: u16, h: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
        terminal.draw(|frame| render(frame, app, now)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content
            .chunks(buf.area.width as usize)
            .map(|row| {
                let s: String = row.iter().map(|cell| cell.symbol()).collect();
                s.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app_with(json: &str) -> App<MemoryStore> {
        let store = MemoryStore::new();
        store.save(TASKS_KEY, json).unwrap();
        App::new(Tracker::open(store, "T").unwrap(), Theme::default())
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    const TASKS: &str = r#"[
  {"id":"T-001","name":"Standup","date":"2024-01-01","start":"09:00","durationSeconds":900,"priority":"High","repeat":"None","routine":false,"completed":false},
  {"id":"T-002","name":"Gym","date":"2024-01-01","start":"07:00","durationSeconds":3600,"priority":"Low","repeat":"None","routine":true,"completed":true}
]"#;

    #[test]
    fn empty_workspace() {
        let app = app_with("[]");
        let out = render_to_string(&app, at(8, 0), 100, 8);
        assert!(out.contains("No tasks yet"));
        assert!(out.contains("No tasks scheduled"));
    }

    #[test]
    fn list_in_schedule_order_with_countdown() {
        let app = app_with(TASKS);
        let out = render_to_string(&app, at(8, 0), 100, 8);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("1 pending / 2 total"));
        assert!(lines[2].contains("[x] T-002 Gym"));
        assert!(lines[2].contains("[Routine]"));
        assert!(lines[3].contains("\u{25B6} [ ] T-001 Standup  High"));
        assert!(out.contains("Next task \"Standup\" starts in 1h 0m 0s"));
    }

    #[test]
    fn gauge_shows_progress_while_running() {
        let app = app_with(TASKS);
        let out = render_to_string(&app, at(9, 5), 100, 8);
        assert!(out.contains("Standup 33%"));
        assert!(out.contains("Task \"Standup\" ends in 0h 10m 0s"));
    }

    #[test]
    fn message_replaces_countdown() {
        let mut app = app_with(TASKS);
        app.message = Some("T-001 completed".into());
        let out = render_to_string(&app, at(8, 0), 100, 8);
        assert!(out.contains("T-001 completed"));
        assert!(!out.contains("starts in"));
    }
}
