use std::io::{IsTerminal, Write};

use ansi_term::{Colour, Style};
use anyhow::Result;

use crate::{
    dashboard::brief::{MorningBrief, TaskStats},
    tasks::entities::TaskRecord,
};

use super::{DashboardView, ViewBindings, EMPTY_PLACEHOLDER};

/// Draws the dashboard as plain lines. Every call prints its section again, which in a terminal is
/// the closest thing to replacing the previous view.
pub struct TerminalView<W: Write> {
    out: W,
    bindings: ViewBindings,
    styled: bool,
}

impl TerminalView<std::io::Stdout> {
    /// Colours are only used when stdout is an actual terminal.
    pub fn stdout() -> Self {
        let out = std::io::stdout();
        let styled = out.is_terminal();
        Self::new(out, styled)
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, styled: bool) -> Self {
        Self {
            out,
            bindings: ViewBindings::default(),
            styled,
        }
    }

    pub fn bindings(&self) -> &ViewBindings {
        &self.bindings
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn style(&self, style: Style) -> Style {
        if self.styled {
            style
        } else {
            Style::new()
        }
    }
}

/// Terminal equivalent of markup escaping. Control characters (escape sequences in particular) are
/// printed as literals so task text can't move the cursor or change colours.
pub fn neutralize_control(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            result.extend(c.escape_default());
        } else {
            result.push(c);
        }
    }
    result
}

impl<W: Write> DashboardView for TerminalView<W> {
    fn render_tasks(&mut self, tasks: &[TaskRecord]) -> Result<()> {
        self.bindings.rebind(tasks);

        let header = self.style(Style::new().bold().underline());
        writeln!(self.out)?;
        writeln!(self.out, "{}", header.paint("Tasks"))?;

        if tasks.is_empty() {
            let placeholder = self.style(Style::new().dimmed().italic());
            writeln!(self.out, "  {}", placeholder.paint(EMPTY_PLACEHOLDER))?;
        }

        for (index, task) in tasks.iter().enumerate() {
            let text = neutralize_control(&task.text);
            if task.completed {
                let done = self.style(Colour::Green.strikethrough());
                writeln!(self.out, "  {:>2}. [x] {}", index + 1, done.paint(text))?;
            } else {
                writeln!(self.out, "  {:>2}. [ ] {}", index + 1, text)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn render_stats(&mut self, stats: TaskStats) -> Result<()> {
        let dimmed = self.style(Style::new().dimmed());
        writeln!(
            self.out,
            "{}",
            dimmed.paint(format!(
                "{} total, {} completed",
                stats.total, stats.completed
            ))
        )?;
        self.out.flush()?;
        Ok(())
    }

    fn render_brief(&mut self, brief: &MorningBrief) -> Result<()> {
        let greeting = self.style(Colour::Yellow.bold());
        writeln!(
            self.out,
            "{}",
            greeting.paint(neutralize_control(&brief.greeting_line()))
        )?;
        writeln!(self.out, "{}", brief.date_label)?;
        self.out.flush()?;
        Ok(())
    }

    fn render_metric(&mut self, text: &str) -> Result<()> {
        let label = self.style(Style::new().bold());
        writeln!(self.out, "{} {}", label.paint("Deep work:"), text)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Local, TimeZone, Utc};

    use crate::{
        dashboard::brief::{MorningBrief, TaskStats},
        tasks::entities::{TaskId, TaskRecord},
        view::{DashboardView, TaskAction, EMPTY_PLACEHOLDER},
    };

    use super::{neutralize_control, TerminalView};

    fn output(view: TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn test_empty_list_placeholder() -> Result<()> {
        let mut view = TerminalView::new(vec![], false);
        view.render_tasks(&[])?;

        assert!(output(view).contains(EMPTY_PLACEHOLDER));
        Ok(())
    }

    #[test]
    fn test_rows_and_bindings() -> Result<()> {
        let moment = Utc.with_ymd_and_hms(2018, 7, 4, 12, 0, 0).unwrap();
        let mut done = TaskRecord::new_opt(TaskId(7), "write report", moment).unwrap();
        done.completed = true;
        let tasks = vec![
            TaskRecord::new_opt(TaskId(3), "buy milk", moment).unwrap(),
            done,
        ];

        let mut view = TerminalView::new(vec![], false);
        view.render_tasks(&tasks)?;
        view.render_stats(TaskStats {
            total: 2,
            completed: 1,
        })?;

        assert_eq!(view.bindings().toggle(2), Some(TaskAction::Toggle(TaskId(7))));

        let text = output(view);
        assert!(text.contains("   1. [ ] buy milk"));
        assert!(text.contains("   2. [x] write report"));
        assert!(text.contains("2 total, 1 completed"));
        assert!(!text.contains(EMPTY_PLACEHOLDER));
        Ok(())
    }

    #[test]
    fn test_escape_sequences_are_neutralized() -> Result<()> {
        assert_eq!(neutralize_control("plain text"), "plain text");
        assert_eq!(neutralize_control("\u{1b}[31mred"), "\\u{1b}[31mred");

        let moment = Utc.with_ymd_and_hms(2018, 7, 4, 12, 0, 0).unwrap();
        let task = TaskRecord::new_opt(TaskId(1), "\u{1b}[2Jwipe", moment).unwrap();
        let mut view = TerminalView::new(vec![], false);
        view.render_tasks(&[task])?;

        assert!(!output(view).contains('\u{1b}'));
        Ok(())
    }

    #[test]
    fn test_brief_and_metric() -> Result<()> {
        let now = Local.with_ymd_and_hms(2018, 7, 4, 8, 0, 0).unwrap();
        let mut view = TerminalView::new(vec![], false);
        view.render_brief(&MorningBrief::at(now, Some("Sam")))?;
        view.render_metric("3.3 hrs")?;

        assert_eq!(
            output(view),
            "Good morning, Sam\nWednesday, July 4, 2018\nDeep work: 3.3 hrs\n"
        );
        Ok(())
    }
}
