use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime, Timelike};
use regex::Regex;

use crate::model::task::{Priority, Repeat, Task};

/// Reasons a candidate task is refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("task name is required")]
    MissingName,
    #[error("task date is required")]
    MissingDate,
    #[error("task start time is required")]
    MissingStart,
    #[error("duration must be greater than zero")]
    NonPositiveDuration,
    #[error("invalid duration: {0} (expected e.g. 1h30m, 45m, 90s)")]
    InvalidDuration(String),
}

/// Unvalidated task fields as collected from user input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveTime>,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub priority: Priority,
    pub repeat: Repeat,
    pub routine: bool,
}

impl Candidate {
    /// Pre-fill a candidate from an existing task (the edit form)
    pub fn from_task(task: &Task) -> Self {
        let total = i64::from(task.duration_seconds);
        Candidate {
            name: task.name.clone(),
            date: Some(task.date),
            start: Some(task.start),
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
            priority: task.priority,
            repeat: task.repeat,
            routine: task.routine,
        }
    }

    /// Duration in seconds, or `InvalidDuration` if it does not fit an `i64`
    pub fn total_seconds(&self) -> Result<i64, ValidationError> {
        combine(self.hours, self.minutes, self.seconds).ok_or_else(|| {
            ValidationError::InvalidDuration(format!(
                "{}h {}m {}s",
                self.hours, self.minutes, self.seconds
            ))
        })
    }

    /// Replace the duration parts with the given total
    pub fn set_duration(&mut self, total: i64) {
        self.hours = total / 3600;
        self.minutes = (total % 3600) / 60;
        self.seconds = total % 60;
    }

    /// Check the candidate and turn it into an (unidentified, incomplete) task.
    /// Start times are truncated to the minute.
    pub fn validate(&self) -> Result<Task, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let date = self.date.ok_or(ValidationError::MissingDate)?;
        let start = self.start.ok_or(ValidationError::MissingStart)?;
        let total = self.total_seconds()?;
        if total <= 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        let duration_seconds =
            u32::try_from(total).map_err(|_| ValidationError::InvalidDuration(total.to_string()))?;

        Ok(Task {
            id: String::new(),
            name: name.to_string(),
            date,
            start: start.with_second(0).unwrap_or(start),
            duration_seconds,
            priority: self.priority,
            repeat: self.repeat,
            routine: self.routine,
            completed: false,
        })
    }
}

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*(?:(\d+)\s*s)?$").expect("valid regex")
});

/// Parse a compact duration like `1h30m`, `45m`, `1h 0m 5s` or a bare number
/// of seconds. Returns the total in seconds.
pub fn parse_duration(s: &str) -> Result<i64, ValidationError> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<i64>() {
        return Ok(secs);
    }
    let invalid = || ValidationError::InvalidDuration(s.to_string());
    let caps = DURATION_RE.captures(s).filter(|_| !s.is_empty()).ok_or_else(invalid)?;

    let part = |i: usize| -> Result<i64, ValidationError> {
        caps.get(i)
            .map_or(Ok(0), |m| m.as_str().parse::<i64>().map_err(|_| invalid()))
    };
    combine(part(1)?, part(2)?, part(3)?).ok_or_else(invalid)
}

/// `h * 3600 + m * 60 + s`, `None` on overflow
fn combine(hours: i64, minutes: i64, seconds: i64) -> Option<i64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

/// One past the highest numeric suffix among `tasks` for the given prefix.
/// Numbers of deleted tasks are not visible here; the tracker keeps its own
/// high-water mark so they are not handed out again.
pub fn next_id_number(tasks: &[Task], prefix: &str) -> usize {
    let pattern = format!("{}-", prefix);
    tasks
        .iter()
        .filter_map(|t| t.id.strip_prefix(&pattern))
        .filter_map(|num| num.parse::<usize>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

/// Format an ID like `T-007`
pub fn format_id(prefix: &str, number: usize) -> String {
    format!("{}-{:03}", prefix, number)
}
