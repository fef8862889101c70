use std::cmp::Ordering;

use crate::model::task::Task;

/// Result of looking for the next task to work on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextActive<'a> {
    /// The collection is empty
    NoTasks,
    /// Every task is completed
    NoUpcoming,
    Task(&'a Task),
}

impl<'a> NextActive<'a> {
    pub fn task(self) -> Option<&'a Task> {
        match self {
            NextActive::Task(task) => Some(task),
            _ => None,
        }
    }
}

/// Schedule order: start instant ascending, then priority descending.
/// Ties on both keep their relative order.
pub fn compare(a: &Task, b: &Task) -> Ordering {
    a.start_instant()
        .cmp(&b.start_instant())
        .then_with(|| b.priority.cmp(&a.priority))
}

/// Return the tasks in schedule order. The input is left untouched.
pub fn order(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    // sort_by is stable
    ordered.sort_by(|a, b| compare(a, b));
    ordered
}

/// The first incomplete task in schedule order
pub fn next_active(tasks: &[Task]) -> NextActive<'_> {
    if tasks.is_empty() {
        return NextActive::NoTasks;
    }
    tasks
        .iter()
        .filter(|t| !t.completed)
        .min_by(|a, b| compare(a, b))
        .map_or(NextActive::NoUpcoming, NextActive::Task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Priority, Repeat};
    use chrono::{NaiveDate, NaiveTime};

    fn task(name: &str, date: (i32, u32, u32), start: (u32, u32), priority: Priority) -> Task {
        Task {
            id: format!("T-{}", name),
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            duration_seconds: 600,
            priority,
            repeat: Repeat::None,
            routine: false,
            completed: false,
        }
    }

    fn names(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn earlier_start_first() {
        let tasks = vec![
            task("late", (2024, 1, 2), (8, 0), Priority::High),
            task("early", (2024, 1, 1), (23, 59), Priority::Low),
            task("mid", (2024, 1, 2), (7, 30), Priority::Medium),
        ];
        assert_eq!(names(&order(&tasks)), vec!["early", "mid", "late"]);
    }

    #[test]
    fn equal_start_higher_priority_first() {
        let tasks = vec![
            task("low", (2024, 1, 1), (9, 0), Priority::Low),
            task("high", (2024, 1, 1), (9, 0), Priority::High),
            task("medium", (2024, 1, 1), (9, 0), Priority::Medium),
        ];
        assert_eq!(names(&order(&tasks)), vec!["high", "medium", "low"]);
    }

    #[test]
    fn full_ties_keep_insertion_order() {
        let tasks = vec![
            task("first", (2024, 1, 1), (9, 0), Priority::Medium),
            task("second", (2024, 1, 1), (9, 0), Priority::Medium),
            task("third", (2024, 1, 1), (9, 0), Priority::Medium),
        ];
        assert_eq!(names(&order(&tasks)), vec!["first", "second", "third"]);
    }

    #[test]
    fn order_does_not_reorder_input() {
        let tasks = vec![
            task("b", (2024, 1, 2), (9, 0), Priority::Medium),
            task("a", (2024, 1, 1), (9, 0), Priority::Medium),
        ];
        let _ = order(&tasks);
        assert_eq!(tasks[0].name, "b");
    }

    #[test]
    fn next_active_distinguishes_empty_from_all_done() {
        assert_eq!(next_active(&[]), NextActive::NoTasks);

        let mut done = task("done", (2024, 1, 1), (9, 0), Priority::High);
        done.completed = true;
        assert_eq!(next_active(&[done]), NextActive::NoUpcoming);
    }

    #[test]
    fn next_active_skips_completed() {
        let mut first = task("first", (2024, 1, 1), (9, 0), Priority::High);
        first.completed = true;
        let tasks = vec![
            task("third", (2024, 1, 1), (11, 0), Priority::High),
            first,
            task("second", (2024, 1, 1), (10, 0), Priority::Low),
        ];
        assert_eq!(next_active(&tasks).task().unwrap().name, "second");
    }

    #[test]
    fn next_active_tie_prefers_earliest_inserted() {
        let tasks = vec![
            task("a", (2024, 1, 1), (9, 0), Priority::Medium),
            task("b", (2024, 1, 1), (9, 0), Priority::Medium),
        ];
        assert_eq!(next_active(&tasks).task().unwrap().name, "a");
    }
}
