use std::fmt::Write;

use anyhow::Result;

use crate::{
    dashboard::brief::{MorningBrief, TaskStats},
    tasks::entities::TaskRecord,
};

use super::{DashboardView, ViewBindings, EMPTY_PLACEHOLDER};

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Collects the dashboard into a standalone HTML document. Each section is kept as already rendered
/// markup and replaced wholesale on the next call.
#[derive(Debug, Default)]
pub struct HtmlView {
    greeting: String,
    date_label: String,
    metric: String,
    stats: TaskStats,
    task_list: String,
    bindings: ViewBindings,
}

impl HtmlView {
    pub fn new() -> Self {
        Self {
            metric: "Loading...".into(),
            ..Default::default()
        }
    }

    pub fn bindings(&self) -> &ViewBindings {
        &self.bindings
    }

    pub fn task_list(&self) -> &str {
        &self.task_list
    }

    pub fn to_document(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Daily Brief</title>
</head>
<body>
<header>
  <h1 id="greeting">{greeting}</h1>
  <p id="dateLabel">{date_label}</p>
</header>
<section class="metrics">
  <div class="metric"><span class="label">Deep Work</span> <span id="deepWorkValue">{metric}</span></div>
  <div class="metric"><span class="label">Tasks</span> <span id="totalTasks">{total}</span></div>
  <div class="metric"><span class="label">Completed</span> <span id="completedTasks">{completed}</span></div>
</section>
<section class="tasks">
  <form class="task-input">
    <input type="text" id="taskInput" placeholder="What needs to be done today?">
    <button type="submit" id="addTaskBtn">Add</button>
  </form>
  <ul id="taskList" class="task-list">
{task_list}  </ul>
</section>
</body>
</html>
"#,
            greeting = self.greeting,
            date_label = self.date_label,
            metric = self.metric,
            total = self.stats.total,
            completed = self.stats.completed,
            task_list = self.task_list,
        )
    }
}

impl DashboardView for HtmlView {
    fn render_tasks(&mut self, tasks: &[TaskRecord]) -> Result<()> {
        self.bindings.rebind(tasks);
        self.task_list.clear();

        if tasks.is_empty() {
            writeln!(
                self.task_list,
                r#"    <li class="empty-state">{EMPTY_PLACEHOLDER}</li>"#
            )?;
            return Ok(());
        }

        for task in tasks {
            let (class, checked) = if task.completed {
                ("task-item completed", " checked")
            } else {
                ("task-item", "")
            };
            writeln!(
                self.task_list,
                r#"    <li class="{class}" data-task-id="{id}"><input type="checkbox" data-action="toggle"{checked}> <span class="task-text">{text}</span> <button class="delete-btn" data-action="delete">Delete</button></li>"#,
                id = task.id,
                text = html_escape(&task.text),
            )?;
        }
        Ok(())
    }

    fn render_stats(&mut self, stats: TaskStats) -> Result<()> {
        self.stats = stats;
        Ok(())
    }

    fn render_brief(&mut self, brief: &MorningBrief) -> Result<()> {
        self.greeting = html_escape(&brief.greeting_line());
        self.date_label = html_escape(&brief.date_label);
        Ok(())
    }

    fn render_metric(&mut self, text: &str) -> Result<()> {
        self.metric = html_escape(text);
        Ok(())
    }
}
