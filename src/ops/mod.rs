pub mod countdown;
pub mod recurrence;
pub mod schedule;
pub mod task_ops;
pub mod tracker;
