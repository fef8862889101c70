use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::io::store_io::{self, KeyValueStore, StoreError};
use crate::model::config::DuplicatePolicy;
use crate::model::task::Task;
use crate::ops::countdown::{self, Countdown};
use crate::ops::recurrence;
use crate::ops::schedule::{self, NextActive};
use crate::ops::task_ops::{self, Candidate, ValidationError};

/// Error type for task store operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What `add` did with a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended as a new task
    Added(String),
    /// Folded into an existing task of the same name
    Merged(String),
    /// Dropped because a task of the same name exists
    Skipped(String),
}

impl AddOutcome {
    pub fn id(&self) -> &str {
        match self {
            AddOutcome::Added(id) | AddOutcome::Merged(id) | AddOutcome::Skipped(id) => id,
        }
    }
}

/// What `submit` did with the form contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Added(AddOutcome),
    Updated(String),
}

/// Result of flipping a task's completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggled {
    pub completed: bool,
    /// ID of the successor created for a recurring or routine task
    pub successor: Option<String>,
}

/// Owns the task collection and writes it through to a store.
///
/// Tasks are kept in insertion order; views sort on demand. Every successful
/// mutation saves the whole collection before returning. Rejected input
/// leaves both memory and store untouched.
pub struct Tracker<S: KeyValueStore> {
    tasks: Vec<Task>,
    store: S,
    id_prefix: String,
    /// Highest ID number ever handed out per prefix, so deleted IDs stay retired
    issued: HashMap<String, usize>,
    editing: Option<String>,
}

impl<S: KeyValueStore> Tracker<S> {
    /// Load the collection from `store`. Records without an ID (written by
    /// older versions) get one now; it is saved with the next mutation.
    pub fn open(store: S, id_prefix: &str) -> Result<Self, TaskError> {
        let tasks = store_io::load_tasks(&store)?;
        let issued = store_io::load_sequence(&store)?;
        let mut tracker = Tracker {
            tasks,
            store,
            id_prefix: id_prefix.to_string(),
            issued,
            editing: None,
        };
        tracker.assign_missing_ids();
        tracing::debug!(count = tracker.tasks.len(), "opened task store");
        Ok(tracker)
    }

    /// Re-read the collection, dropping any edit target that no longer exists
    pub fn reload(&mut self) -> Result<(), TaskError> {
        self.tasks = store_io::load_tasks(&self.store)?;
        self.issued = store_io::load_sequence(&self.store)?;
        self.assign_missing_ids();
        if let Some(id) = &self.editing
            && self.position(id).is_none()
        {
            self.editing = None;
        }
        Ok(())
    }

    fn assign_missing_ids(&mut self) {
        let missing = self.tasks.iter().filter(|t| t.id.is_empty()).count();
        if missing == 0 {
            return;
        }
        tracing::warn!(count = missing, "assigning IDs to tasks without one");
        for i in 0..self.tasks.len() {
            if self.tasks[i].id.is_empty() {
                self.tasks[i].id = self.fresh_id();
            }
        }
    }

    /// Next ID for the configured prefix: above every stored task and every
    /// ID issued before.
    fn fresh_id(&mut self) -> String {
        let stored = task_ops::next_id_number(&self.tasks, &self.id_prefix);
        let issued = self.issued.entry(self.id_prefix.clone()).or_insert(0);
        let next = stored.max(*issued + 1);
        *issued = next;
        task_ops::format_id(&self.id_prefix, next)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn position_or_err(&self, id: &str) -> Result<usize, TaskError> {
        self.position(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    fn persist(&self) -> Result<(), TaskError> {
        store_io::save_tasks(&self.store, &self.tasks)?;
        store_io::save_sequence(&self.store, &self.issued)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tasks in schedule order
    pub fn ordered(&self) -> Vec<&Task> {
        schedule::order(&self.tasks)
    }

    pub fn next_active(&self) -> NextActive<'_> {
        schedule::next_active(&self.tasks)
    }

    pub fn countdown(&self, now: NaiveDateTime) -> Countdown<'_> {
        countdown::report(&self.tasks, now)
    }

    /// Sum of all task durations, completed ones included
    pub fn total_duration(&self) -> u64 {
        self.tasks
            .iter()
            .map(|t| u64::from(t.duration_seconds))
            .sum()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Add a task. One-off tasks whose name matches an existing task
    /// (case-insensitively) are resolved with `policy`; recurring and
    /// routine tasks are always appended.
    pub fn add(
        &mut self,
        candidate: &Candidate,
        policy: DuplicatePolicy,
    ) -> Result<AddOutcome, TaskError> {
        let mut task = candidate.validate()?;

        let duplicate = if task.recurs() {
            None
        } else {
            let wanted = task.name.to_lowercase();
            self.tasks
                .iter()
                .position(|t| t.name.to_lowercase() == wanted)
        };

        let outcome = match (duplicate, policy) {
            (Some(pos), DuplicatePolicy::Merge) => {
                task.id = self.tasks[pos].id.clone();
                self.tasks[pos] = task;
                AddOutcome::Merged(self.tasks[pos].id.clone())
            }
            (Some(pos), DuplicatePolicy::Reject) => {
                tracing::info!(name = %task.name, existing = %self.tasks[pos].id, "duplicate task dropped");
                return Ok(AddOutcome::Skipped(self.tasks[pos].id.clone()));
            }
            (Some(_), DuplicatePolicy::Keep) | (None, _) => {
                task.id = self.fresh_id();
                let id = task.id.clone();
                self.tasks.push(task);
                AddOutcome::Added(id)
            }
        };

        self.persist()?;
        tracing::info!(?outcome, "task added");
        Ok(outcome)
    }

    /// Replace a task's fields, keeping its ID and completion state
    pub fn update(&mut self, id: &str, candidate: &Candidate) -> Result<(), TaskError> {
        let pos = self.position_or_err(id)?;
        let mut task = candidate.validate()?;
        task.id = self.tasks[pos].id.clone();
        task.completed = self.tasks[pos].completed;
        self.tasks[pos] = task;
        self.persist()?;
        tracing::info!(id, "task updated");
        Ok(())
    }

    /// Remove a task, returning it
    pub fn delete(&mut self, id: &str) -> Result<Task, TaskError> {
        let pos = self.position_or_err(id)?;
        let removed = self.tasks.remove(pos);
        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }
        self.persist()?;
        tracing::info!(id, "task deleted");
        Ok(removed)
    }

    /// Flip completion. Completing a recurring or routine task appends its
    /// successor; the completed task stays in place as history.
    pub fn toggle_complete(&mut self, id: &str) -> Result<Toggled, TaskError> {
        let pos = self.position_or_err(id)?;
        let completed = !self.tasks[pos].completed;
        self.tasks[pos].completed = completed;

        let mut successor = None;
        if completed && let Some(mut next) = recurrence::advance(&self.tasks[pos]) {
            next.id = self.fresh_id();
            tracing::info!(from = id, to = %next.id, date = %next.date, "scheduled next occurrence");
            successor = Some(next.id.clone());
            self.tasks.push(next);
        }

        self.persist()?;
        Ok(Toggled {
            completed,
            successor,
        })
    }

    /// Remove every completed task, returning how many went
    pub fn clear_completed(&mut self) -> Result<usize, TaskError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();
        if removed > 0 {
            if let Some(id) = &self.editing
                && self.position(id).is_none()
            {
                self.editing = None;
            }
            self.persist()?;
            tracing::info!(removed, "cleared completed tasks");
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Edit mode
    // -----------------------------------------------------------------------

    /// Make `id` the edit target and return its fields for the form
    pub fn begin_edit(&mut self, id: &str) -> Result<Candidate, TaskError> {
        let pos = self.position_or_err(id)?;
        self.editing = Some(id.to_string());
        Ok(Candidate::from_task(&self.tasks[pos]))
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// The current edit target, if any
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Apply form contents: update the edit target if one is set, add
    /// otherwise. The edit target is cleared once the update succeeds.
    pub fn submit(
        &mut self,
        candidate: &Candidate,
        policy: DuplicatePolicy,
    ) -> Result<Submitted, TaskError> {
        match self.editing.clone() {
            Some(id) => {
                self.update(&id, candidate)?;
                self.editing = None;
                Ok(Submitted::Updated(id))
            }
            None => self.add(candidate, policy).map(Submitted::Added),
        }
    }
}
