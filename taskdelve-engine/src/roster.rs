//! The account's active task collection.
//!
//! Tasks are credited on removal, not on creation. Whether a removal
//! counts as a completion is the caller's call: the facade compares its
//! clock against the task deadline at action time and passes the flag in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::Ledger;
use crate::task::{Task, TaskId};

/// Errors raised by roster operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("no task was found with id {0}")]
    NotFound(TaskId),
}

/// Outcome of removing a task from the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTask {
    /// The task that was removed.
    pub task: Task,
    /// Points actually credited (clamped by the ledger ceiling; zero when
    /// the task was abandoned or expired).
    pub credited: i64,
}

/// Insertion-ordered collection of a user's active tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRoster {
    tasks: Vec<Task>,
}

impl TaskRoster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a validated task. No ledger interaction happens here.
    pub fn add(&mut self, task: Task) -> TaskId {
        let id = task.id();
        self.tasks.push(task);
        id
    }

    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// Active tasks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove a task, crediting its reward iff `completed`.
    ///
    /// Removal and crediting happen together or not at all: the id is
    /// checked before anything is mutated.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::NotFound`] when `id` is not in the roster —
    /// including on a second resolve of the same id.
    pub fn resolve(
        &mut self,
        id: TaskId,
        completed: bool,
        ledger: &mut Ledger,
    ) -> Result<ResolvedTask, RosterError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id() == id)
            .ok_or(RosterError::NotFound(id))?;
        let task = self.tasks.remove(index);
        let credited = if completed {
            let credited = ledger.earn(task.points());
            ledger.record_task_completion();
            credited
        } else {
            0
        };
        Ok(ResolvedTask { task, credited })
    }
}

impl<'a> IntoIterator for &'a TaskRoster {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
