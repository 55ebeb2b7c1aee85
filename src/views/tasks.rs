//! Worker task list state.

use crate::api::types::TaskInstance;

use super::{Collection, Reconcile, ViewScope};

/// A worker's action on a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    Complete { comment: Option<String> },
    Skip { reason: Option<String> },
}

impl TaskAction {
    /// Toast shown after the server confirms the action.
    pub fn success_message(&self) -> &'static str {
        match self {
            TaskAction::Complete { .. } => "Task completed!",
            TaskAction::Skip { .. } => "Task skipped",
        }
    }
}

/// Today's tasks for the logged-in worker.
///
/// Completing or skipping reloads: the server stamps completion time and
/// who did it.
#[derive(Debug)]
pub struct TasksView {
    scope: ViewScope,
    tasks: Collection<TaskInstance>,
}

impl TasksView {
    pub const UPDATE: Reconcile = Reconcile::Reload;

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            tasks: Collection::default(),
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope
    }

    pub fn on_loaded(&mut self, tasks: Vec<TaskInstance>) {
        self.tasks.replace(tasks);
    }

    pub fn tasks(&self) -> &[TaskInstance] {
        self.tasks.items()
    }

    /// Tasks with the given status (`pending`, `done`, `skipped`).
    pub fn with_status<'a>(&'a self, status: &'a str) -> impl Iterator<Item = &'a TaskInstance> {
        self.tasks.items().iter().filter(move |t| t.status == status)
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.items().iter().filter(|t| t.is_pending()).count()
    }

    pub fn is_loaded(&self) -> bool {
        self.tasks.is_loaded()
    }
}
