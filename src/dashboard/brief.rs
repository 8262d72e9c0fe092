use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDate, Timelike};

use crate::tasks::entities::TaskRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Morning,
    Afternoon,
    Evening,
}

impl Display for Greeting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Greeting::Morning => write!(f, "Good morning"),
            Greeting::Afternoon => write!(f, "Good afternoon"),
            Greeting::Evening => write!(f, "Good evening"),
        }
    }
}

/// Afternoon is [12, 17), evening is [17, 24) and [0, 5). Everything else is morning.
pub fn greeting(hour: u32) -> Greeting {
    match hour {
        12..=16 => Greeting::Afternoon,
        17..=23 | 0..=4 => Greeting::Evening,
        _ => Greeting::Morning,
    }
}

/// Long form date, for example "Sunday, October 18, 2026".
pub fn date_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
}

pub fn stats(tasks: &[TaskRecord]) -> TaskStats {
    TaskStats {
        total: tasks.len(),
        completed: tasks.iter().filter(|v| v.completed).count(),
    }
}

/// Header of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorningBrief {
    pub greeting: Greeting,
    pub name: Option<String>,
    pub date_label: String,
}

impl MorningBrief {
    pub fn at(now: DateTime<Local>, name: Option<&str>) -> Self {
        Self {
            greeting: greeting(now.hour()),
            name: name.map(str::trim).filter(|v| !v.is_empty()).map(Into::into),
            date_label: date_label(now.date_naive()),
        }
    }

    pub fn greeting_line(&self) -> String {
        match &self.name {
            Some(name) => format!("{}, {name}", self.greeting),
            None => self.greeting.to_string(),
        }
    }
}
