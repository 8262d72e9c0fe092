use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, instrument};

use crate::{
    dashboard::brief::stats,
    view::{DashboardView, TaskAction},
};

use super::{
    entities::{TaskId, TaskIdGenerator, TaskRecord},
    local_storage::LocalStorage,
    task_store::TaskStore,
};

/// Owner of the in-memory task list. Every successful change is persisted first, then the list and
/// the counters are redrawn.
pub struct TaskListManager<S: LocalStorage, V: DashboardView> {
    store: TaskStore<S>,
    view: V,
    tasks: Vec<TaskRecord>,
    ids: TaskIdGenerator,
}

impl<S: LocalStorage, V: DashboardView> TaskListManager<S, V> {
    /// Runs the daily reset, loads today's tasks and draws them. Storage problems are logged and
    /// result in an empty list.
    pub async fn start(store: TaskStore<S>, view: V) -> Result<Self> {
        if let Err(e) = store.reset_if_new_day().await {
            error!("Daily reset failed, continuing with stored tasks {e:?}");
        }
        let tasks = store.load_today().await;
        debug!("Loaded {} tasks", tasks.len());

        let mut manager = Self {
            store,
            view,
            ids: TaskIdGenerator::after(&tasks),
            tasks,
        };
        manager.redraw()?;
        Ok(manager)
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    /// Appends a task. Blank text is ignored and `None` is returned.
    #[instrument(skip(self))]
    pub async fn add(&mut self, text: &str) -> Result<Option<TaskId>> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank task");
            return Ok(None);
        }
        let now = self.store.clock().now().with_timezone(&Utc);
        let id = self.ids.next(now, &self.tasks);

        self.tasks.push(TaskRecord::open(id, text, now));
        self.commit().await?;
        Ok(Some(id))
    }

    /// Flips completion of a task. Returns `false` if there is no such task.
    #[instrument(skip(self))]
    pub async fn toggle(&mut self, id: TaskId) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|v| v.id == id) else {
            debug!("No task to toggle");
            return Ok(false);
        };
        task.completed = !task.completed;

        self.commit().await?;
        Ok(true)
    }

    /// Deletes a task. Returns `false` if there is no such task, so removing twice is harmless.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, id: TaskId) -> Result<bool> {
        let Some(position) = self.tasks.iter().position(|v| v.id == id) else {
            debug!("No task to remove");
            return Ok(false);
        };
        self.tasks.remove(position);

        self.commit().await?;
        Ok(true)
    }

    /// Dispatches an interaction coming from a rendered row.
    pub async fn apply(&mut self, action: TaskAction) -> Result<bool> {
        match action {
            TaskAction::Toggle(id) => self.toggle(id).await,
            TaskAction::Delete(id) => self.remove(id).await,
        }
    }

    async fn commit(&mut self) -> Result<()> {
        // The view follows memory even if saving failed, the error is still reported to the caller.
        let saved = self.store.save_today(&self.tasks).await;
        self.redraw()?;
        saved
    }

    /// Draws the list and counters from memory, without touching storage.
    pub fn redraw(&mut self) -> Result<()> {
        self.view.render_tasks(&self.tasks)?;
        self.view.render_stats(stats(&self.tasks))
    }
}
