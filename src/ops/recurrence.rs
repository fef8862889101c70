use chrono::Days;

use crate::model::task::{Repeat, Task};

/// Build the successor of a completed recurring or routine task.
///
/// The new date is computed from the task's stored date, not from when it was
/// completed, so a task finished late still lands on its regular slot. The
/// successor is incomplete and carries the source's ID; callers assign a
/// fresh one before storing it. Returns `None` for one-off tasks.
pub fn advance(task: &Task) -> Option<Task> {
    let days = if task.routine || task.repeat == Repeat::Daily {
        1
    } else if task.repeat == Repeat::Weekly {
        7
    } else {
        return None;
    };

    let date = task.date.checked_add_days(Days::new(days))?;
    Some(Task {
        date,
        completed: false,
        ..task.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use chrono::{NaiveDate, NaiveTime};

    fn task(date: &str, repeat: Repeat, routine: bool) -> Task {
        Task {
            id: "T-001".into(),
            name: "Water plants".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            start: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            duration_seconds: 300,
            priority: Priority::Low,
            repeat,
            routine,
            completed: true,
        }
    }

    #[test]
    fn daily_advances_one_day() {
        let next = advance(&task("2024-03-10", Repeat::Daily, false)).unwrap();
        assert_eq!(next.date.to_string(), "2024-03-11");
        assert!(!next.completed);
    }

    #[test]
    fn weekly_advances_seven_days() {
        let next = advance(&task("2024-02-26", Repeat::Weekly, false)).unwrap();
        assert_eq!(next.date.to_string(), "2024-03-04");
    }

    #[test]
    fn routine_is_daily_regardless_of_repeat() {
        for repeat in [Repeat::None, Repeat::Daily, Repeat::Weekly] {
            let next = advance(&task("2024-12-31", repeat, true)).unwrap();
            assert_eq!(next.date.to_string(), "2025-01-01");
            assert!(!next.completed);
            assert_eq!(next.repeat, repeat);
        }
    }

    #[test]
    fn one_off_has_no_successor() {
        assert!(advance(&task("2024-03-10", Repeat::None, false)).is_none());
    }

    #[test]
    fn copies_other_fields() {
        let source = task("2024-03-10", Repeat::Daily, false);
        let next = advance(&source).unwrap();
        assert_eq!(next.name, source.name);
        assert_eq!(next.start, source.start);
        assert_eq!(next.duration_seconds, source.duration_seconds);
        assert_eq!(next.priority, source.priority);
        // Source untouched
        assert!(source.completed);
        assert_eq!(source.date.to_string(), "2024-03-10");
    }
}
