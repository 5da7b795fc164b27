use thiserror::Error;
use tracing::{debug, info};

use crate::id::TaskId;
use crate::task::{DatePatch, Task, TaskUpdate, ValidationError, normalize_date, validate_title};

/// Errors raised when the store is addressed with a position or id it does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Positional access outside `0..len`.
    #[error("index {index} out of range for {len} tasks")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Number of tasks at the time of the call.
        len: usize,
    },
    /// No task carries the identifier.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    /// An update carried an invalid title.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Ordered in-memory task list backing the list screen.
///
/// Tasks keep insertion order. Positional operations address the current
/// index, which shifts when earlier tasks are removed; the id-keyed variants
/// survive such shifts.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Append a task at the end of the list.
    pub fn append(&mut self, task: Task) -> TaskId {
        let id = task.id;
        debug!(task = %id, position = self.tasks.len(), "append task");
        self.tasks.push(task);
        id
    }

    /// Current tasks in display order.
    #[must_use]
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks held.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true when no task is held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a task by id.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Current position of a task.
    #[must_use]
    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// Remove the task at `index`, shifting later tasks down by one.
    ///
    /// # Errors
    /// Returns [`StoreError::IndexOutOfRange`] and leaves the store untouched
    /// when `index` is not a valid position.
    pub fn remove_at(&mut self, index: usize) -> Result<Task, StoreError> {
        self.check_index(index)?;
        let task = self.tasks.remove(index);
        info!(task = %task.id, index, "removed task");
        Ok(task)
    }

    /// Remove the task carrying `id`.
    ///
    /// # Errors
    /// Returns [`StoreError::TaskNotFound`] when no task has the id.
    pub fn remove(&mut self, id: TaskId) -> Result<Task, StoreError> {
        let index = self.position(id).ok_or(StoreError::TaskNotFound(id))?;
        self.remove_at(index)
    }

    /// Flip the completion flag of the task at `index` and return the new value.
    ///
    /// # Errors
    /// Returns [`StoreError::IndexOutOfRange`] when `index` is not a valid position.
    pub fn toggle_completion(&mut self, index: usize) -> Result<bool, StoreError> {
        self.check_index(index)?;
        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        debug!(task = %task.id, completed = task.completed, "toggled completion");
        Ok(task.completed)
    }

    /// Flip the completion flag of the task carrying `id`.
    ///
    /// # Errors
    /// Returns [`StoreError::TaskNotFound`] when no task has the id.
    pub fn toggle(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let index = self.position(id).ok_or(StoreError::TaskNotFound(id))?;
        self.toggle_completion(index)
    }

    /// Commit an edit to the task carrying `id`. The completion flag is kept.
    ///
    /// # Errors
    /// Returns [`StoreError::TaskNotFound`] for an unknown id and
    /// [`StoreError::Validation`] when the new title is blank. Nothing is
    /// changed on error.
    pub fn update(&mut self, id: TaskId, update: TaskUpdate) -> Result<&Task, StoreError> {
        let index = self.position(id).ok_or(StoreError::TaskNotFound(id))?;
        let title = update.title.as_deref().map(validate_title).transpose()?;

        let task = &mut self.tasks[index];
        if let Some(title) = title {
            task.title = title;
        }
        match update.date {
            Some(DatePatch::Set { date }) => task.date = normalize_date(Some(date)),
            Some(DatePatch::Clear) => task.date = None,
            None => {}
        }
        info!(task = %id, "updated task");
        Ok(task)
    }

    const fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index < self.tasks.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                index,
                len: self.tasks.len(),
            })
        }
    }
}
