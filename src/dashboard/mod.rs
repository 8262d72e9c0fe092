//! Wires the pieces of the dashboard together. Opening a [Dashboard] performs the start-up flow:
//! the brief is drawn, the daily reset runs, today's tasks are loaded and drawn. The metric is
//! fetched separately through [Dashboard::refresh_metrics] or [Dashboard::show_metric], so the
//! caller decides whether to wait for it.

pub mod brief;
pub mod metrics;

use std::sync::Arc;

use anyhow::Result;
use brief::MorningBrief;
use metrics::{display_text, MetricsSource};

use crate::{
    tasks::{local_storage::LocalStorage, manager::TaskListManager, task_store::TaskStore},
    utils::clock::Clock,
    view::DashboardView,
};

#[derive(Debug, Clone, Default)]
pub struct DashboardSettings {
    /// Appended to the greeting when present.
    pub name: Option<String>,
}

pub struct Dashboard<S: LocalStorage, V: DashboardView> {
    manager: TaskListManager<S, V>,
    settings: DashboardSettings,
}

impl<S: LocalStorage, V: DashboardView> Dashboard<S, V> {
    pub async fn open(
        storage: S,
        mut view: V,
        clock: Arc<dyn Clock>,
        settings: DashboardSettings,
    ) -> Result<Self> {
        view.render_brief(&MorningBrief::at(clock.now(), settings.name.as_deref()))?;

        let store = TaskStore::new(storage, clock);
        let manager = TaskListManager::start(store, view).await?;
        Ok(Self { manager, settings })
    }

    pub fn manager(&self) -> &TaskListManager<S, V> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut TaskListManager<S, V> {
        &mut self.manager
    }

    /// Recomputes greeting and date, for sessions that outlive the hour they started in.
    pub fn refresh_brief(&mut self) -> Result<()> {
        let now = self.manager.store().clock().now();
        let brief = MorningBrief::at(now, self.settings.name.as_deref());
        self.manager.view_mut().render_brief(&brief)
    }

    /// Waits for the metric and draws it. Fetch failures are drawn as the fallback text.
    pub async fn refresh_metrics(&mut self, source: &dyn MetricsSource) -> Result<()> {
        let text = display_text(source).await;
        self.show_metric(&text)
    }

    pub fn show_metric(&mut self, text: &str) -> Result<()> {
        self.manager.view_mut().render_metric(text)
    }
}
