use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::model::task::{Priority, Repeat, Task};
use crate::ops::countdown::{Countdown, format_duration};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub end: String,
    pub next: bool,
}

#[derive(Serialize)]
pub struct CountdownJson {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u64>,
    pub progress: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalJson {
    pub total_seconds: u64,
    pub formatted: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json<'a>(task: &'a Task, next_id: Option<&str>) -> TaskJson<'a> {
    TaskJson {
        task,
        end: task.end_instant().format("%Y-%m-%dT%H:%M:%S").to_string(),
        next: next_id == Some(task.id.as_str()),
    }
}

pub fn countdown_to_json(countdown: &Countdown<'_>) -> CountdownJson {
    let (status, seconds) = match countdown {
        Countdown::NoTasks => ("none", None),
        Countdown::NoUpcoming => ("done", None),
        Countdown::StartsIn { seconds, .. } => ("upcoming", Some(*seconds)),
        Countdown::EndsIn { seconds, .. } => ("running", Some(*seconds)),
        Countdown::DeadlinePassed { .. } => ("overdue", None),
    };
    CountdownJson {
        status,
        message: countdown.to_string(),
        task: countdown.task().map(|t| t.id.clone()),
        seconds,
        progress: countdown.progress(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn priority_char(priority: Priority) -> char {
    match priority {
        Priority::High => '!',
        Priority::Medium => '-',
        Priority::Low => '.',
    }
}

/// Recurrence marker: `daily`, `weekly`, `routine` or nothing
fn recurrence_label(task: &Task) -> Option<&'static str> {
    if task.routine {
        Some("routine")
    } else {
        match task.repeat {
            Repeat::None => None,
            Repeat::Daily => Some("daily"),
            Repeat::Weekly => Some("weekly"),
        }
    }
}

/// Pad to a display width (names may hold wide characters)
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

/// Format a task as a one-line summary; `name_width` aligns the columns
pub fn format_task_line(task: &Task, name_width: usize, is_next: bool) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    let marker = if is_next { '>' } else { ' ' };
    let mut line = format!(
        "{}[{}] {} {} {}  {} {}  {}",
        marker,
        check,
        task.id,
        priority_char(task.priority),
        pad(&task.name, name_width),
        task.date,
        task.start.format("%H:%M"),
        format_duration(u64::from(task.duration_seconds)),
    );
    if let Some(label) = recurrence_label(task) {
        line.push_str(&format!("  ({})", label));
    }
    line
}

/// Format an ordered listing, marking the next active task
pub fn format_task_list(tasks: &[&Task], next_id: Option<&str>) -> Vec<String> {
    let name_width = tasks
        .iter()
        .map(|t| UnicodeWidthStr::width(t.name.as_str()))
        .max()
        .unwrap_or(0);
    tasks
        .iter()
        .map(|t| format_task_line(t, name_width, next_id == Some(t.id.as_str())))
        .collect()
}

/// Format the detailed task view
pub fn format_task_detail(task: &Task) -> Vec<String> {
    let mut lines = vec![format!("{} {}", task.id, task.name)];
    lines.push(format!(
        "when: {} {} - {}",
        task.date,
        task.start.format("%H:%M"),
        task.end_instant().format("%Y-%m-%d %H:%M:%S"),
    ));
    lines.push(format!(
        "duration: {}",
        format_duration(u64::from(task.duration_seconds))
    ));
    lines.push(format!("priority: {}", task.priority));
    lines.push(format!("repeat: {}", task.repeat));
    if task.routine {
        lines.push("routine: yes".to_string());
    }
    lines.push(format!(
        "status: {}",
        if task.completed { "completed" } else { "pending" }
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn task(name: &str) -> Task {
        Task {
            id: "T-001".into(),
            name: name.into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration_seconds: 900,
            priority: Priority::High,
            repeat: Repeat::None,
            routine: false,
            completed: false,
        }
    }

    #[test]
    fn task_line() {
        assert_eq!(
            format_task_line(&task("Standup"), 9, true),
            ">[ ] T-001 ! Standup    2024-01-01 09:00  0h 15m 0s"
        );
    }

    #[test]
    fn task_line_marks_recurrence_and_completion() {
        let mut t = task("Gym");
        t.routine = true;
        t.completed = true;
        t.repeat = Repeat::Weekly;
        assert_eq!(
            format_task_line(&t, 3, false),
            " [x] T-001 ! Gym  2024-01-01 09:00  0h 15m 0s  (routine)"
        );
    }

    #[test]
    fn list_aligns_wide_names() {
        let a = task("茶");
        let mut b = task("Tea");
        b.id = "T-002".into();
        let lines = format_task_list(&[&a, &b], None);
        // Both names padded to width 3
        assert!(lines[0].contains("茶   2024"));
        assert!(lines[1].contains("Tea  2024"));
    }

    #[test]
    fn detail() {
        let lines = format_task_detail(&task("Standup"));
        assert_eq!(lines[0], "T-001 Standup");
        assert_eq!(lines[1], "when: 2024-01-01 09:00 - 2024-01-01 09:15:00");
        assert!(lines.contains(&"status: pending".to_string()));
    }

    #[test]
    fn json_shapes() {
        let t = task("Standup");
        let value = serde_json::to_value(task_to_json(&t, Some("T-001"))).unwrap();
        assert_eq!(value["durationSeconds"], 900);
        assert_eq!(value["end"], "2024-01-01T09:15:00");
        assert_eq!(value["next"], true);

        let tasks = [t];
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let cd = crate::ops::countdown::report(&tasks, now);
        let value = serde_json::to_value(countdown_to_json(&cd)).unwrap();
        assert_eq!(value["status"], "upcoming");
        assert_eq!(value["seconds"], 3600);
        assert_eq!(value["task"], "T-001");
    }
}
