//! Contains the presentation side of the dashboard. [DashboardView] is the contract every surface
//! implements, so the task logic never knows whether it is drawing into a terminal, an HTML page or
//! a test double.

pub mod html;
pub mod terminal;

use anyhow::Result;

use crate::{
    dashboard::brief::{MorningBrief, TaskStats},
    tasks::entities::{TaskId, TaskRecord},
};

/// Shown instead of the list when there is nothing to do.
pub const EMPTY_PLACEHOLDER: &str = "No tasks yet. Add one to get started.";

#[cfg_attr(test, mockall::automock)]
pub trait DashboardView {
    /// Replaces the whole task list. Row bindings are rebuilt on every call.
    fn render_tasks(&mut self, tasks: &[TaskRecord]) -> Result<()>;

    fn render_stats(&mut self, stats: TaskStats) -> Result<()>;

    fn render_brief(&mut self, brief: &MorningBrief) -> Result<()>;

    /// Deep work hours display, either a formatted value or the fallback text.
    fn render_metric(&mut self, text: &str) -> Result<()>;
}

/// Interaction coming back from a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// The row checkbox was changed.
    Toggle(TaskId),
    /// The row delete control was used.
    Delete(TaskId),
}

/// Maps visible rows (1-based) to the tasks drawn in them. Equivalent of attaching per-row handlers:
/// it is thrown away and rebuilt with every redraw, so a row number always refers to what the user
/// currently sees.
#[derive(Debug, Default, Clone)]
pub struct ViewBindings {
    rows: Vec<TaskId>,
}

impl ViewBindings {
    pub fn rebind(&mut self, tasks: &[TaskRecord]) {
        self.rows.clear();
        self.rows.extend(tasks.iter().map(|v| v.id));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn task_at(&self, row: usize) -> Option<TaskId> {
        row.checked_sub(1).and_then(|index| self.rows.get(index)).copied()
    }

    pub fn toggle(&self, row: usize) -> Option<TaskAction> {
        self.task_at(row).map(TaskAction::Toggle)
    }

    pub fn delete(&self, row: usize) -> Option<TaskAction> {
        self.task_at(row).map(TaskAction::Delete)
    }
}
