use std::fmt;

use chrono::NaiveDateTime;

use crate::model::task::Task;
use crate::ops::schedule::{self, NextActive};

/// Live status of the next incomplete task relative to a reference clock
#[derive(Debug, Clone, PartialEq)]
pub enum Countdown<'a> {
    NoTasks,
    NoUpcoming,
    StartsIn { task: &'a Task, seconds: u64 },
    EndsIn { task: &'a Task, seconds: u64, progress: f64 },
    DeadlinePassed { task: &'a Task },
}

impl<'a> Countdown<'a> {
    /// The task the countdown refers to, if any
    pub fn task(&self) -> Option<&'a Task> {
        match *self {
            Countdown::StartsIn { task, .. }
            | Countdown::EndsIn { task, .. }
            | Countdown::DeadlinePassed { task } => Some(task),
            Countdown::NoTasks | Countdown::NoUpcoming => None,
        }
    }

    /// Completion percentage in `[0, 100]`; zero unless the task is running
    pub fn progress(&self) -> f64 {
        match *self {
            Countdown::EndsIn { progress, .. } => progress,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Countdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::NoTasks => write!(f, "No tasks scheduled"),
            Countdown::NoUpcoming => write!(f, "No upcoming tasks"),
            Countdown::StartsIn { task, seconds } => write!(
                f,
                "Next task \"{}\" starts in {}",
                task.name,
                format_duration(*seconds)
            ),
            Countdown::EndsIn { task, seconds, .. } => write!(
                f,
                "Task \"{}\" ends in {}",
                task.name,
                format_duration(*seconds)
            ),
            Countdown::DeadlinePassed { task } => {
                write!(f, "Task \"{}\" deadline passed", task.name)
            }
        }
    }
}

/// Compute the countdown for the next incomplete task at `now`
pub fn report(tasks: &[Task], now: NaiveDateTime) -> Countdown<'_> {
    let task = match schedule::next_active(tasks) {
        NextActive::NoTasks => return Countdown::NoTasks,
        NextActive::NoUpcoming => return Countdown::NoUpcoming,
        NextActive::Task(task) => task,
    };

    let start_diff = whole_seconds_until(now, task.start_instant());
    let end_diff = whole_seconds_until(now, task.end_instant());

    if start_diff > 0 {
        Countdown::StartsIn {
            task,
            seconds: start_diff as u64,
        }
    } else if end_diff > 0 {
        let elapsed = (now - task.start_instant()).num_milliseconds() as f64 / 1000.0;
        let fraction = (elapsed / f64::from(task.duration_seconds)).clamp(0.0, 1.0);
        Countdown::EndsIn {
            task,
            seconds: end_diff as u64,
            progress: fraction * 100.0,
        }
    } else {
        Countdown::DeadlinePassed { task }
    }
}

/// Seconds from `now` to `target`, floored
fn whole_seconds_until(now: NaiveDateTime, target: NaiveDateTime) -> i64 {
    (target - now).num_milliseconds().div_euclid(1000)
}

/// Render a second count as `"{h}h {m}m {s}s"`, unpadded
pub fn format_duration(total_seconds: u64) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    format!("{}h {}m {}s", h, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Priority, Repeat};
    use chrono::{NaiveDate, NaiveTime};

    fn standup() -> Task {
        Task {
            id: "T-001".into(),
            name: "Standup".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration_seconds: 900,
            priority: Priority::High,
            repeat: Repeat::None,
            routine: false,
            completed: false,
        }
    }

    fn at(hms: (u32, u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hms.0, hms.1, hms.2)
            .unwrap()
    }

    #[test]
    fn format_duration_decomposes() {
        assert_eq!(format_duration(0), "0h 0m 0s");
        assert_eq!(format_duration(3600), "1h 0m 0s");
        assert_eq!(format_duration(3725), "1h 2m 5s");
        assert_eq!(format_duration(90061), "25h 1m 1s");
    }

    #[test]
    fn empty_collection() {
        assert_eq!(report(&[], at((8, 0, 0))).to_string(), "No tasks scheduled");
    }

    #[test]
    fn all_completed() {
        let mut task = standup();
        task.completed = true;
        let tasks = [task];
        assert_eq!(
            report(&tasks, at((8, 0, 0))).to_string(),
            "No upcoming tasks"
        );
    }

    #[test]
    fn before_start() {
        let tasks = [standup()];
        let countdown = report(&tasks, at((8, 0, 0)));
        assert_eq!(
            countdown.to_string(),
            "Next task \"Standup\" starts in 1h 0m 0s"
        );
        assert_eq!(countdown.progress(), 0.0);
    }

    #[test]
    fn in_progress() {
        let tasks = [standup()];
        let countdown = report(&tasks, at((9, 5, 0)));
        assert_eq!(countdown.to_string(), "Task \"Standup\" ends in 0h 10m 0s");
        assert!((countdown.progress() - 33.333).abs() < 0.01);
    }

    #[test]
    fn at_exact_start_is_in_progress() {
        let tasks = [standup()];
        let countdown = report(&tasks, at((9, 0, 0)));
        assert!(matches!(countdown, Countdown::EndsIn { seconds: 900, .. }));
        assert_eq!(countdown.progress(), 0.0);
    }

    #[test]
    fn after_end() {
        let tasks = [standup()];
        let countdown = report(&tasks, at((9, 20, 0)));
        assert_eq!(countdown.to_string(), "Task \"Standup\" deadline passed");
        assert_eq!(countdown.progress(), 0.0);
        assert_eq!(countdown.task().unwrap().name, "Standup");
    }

    #[test]
    fn sub_second_clock_floors() {
        let tasks = [standup()];
        let now = at((8, 59, 59)) + chrono::Duration::milliseconds(500);
        // 0.5s left floors to 0, so the task counts as started
        assert!(matches!(
            report(&tasks, now),
            Countdown::EndsIn { seconds: 900, .. }
        ));
    }
}
