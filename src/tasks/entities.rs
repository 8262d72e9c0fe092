use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time::local_day;

/// Identity of a task. Looks like a millisecond timestamp, but is only guaranteed to be unique and
/// increasing, see [TaskIdGenerator].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One to-do item, stored as `{ id, text, completed, createdAt }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Creates a new, not completed task. Returns `None` when there is nothing but whitespace.
    pub fn new_opt(id: TaskId, text: &str, created_at: DateTime<Utc>) -> Option<Self> {
        let text = text.trim();
        (!text.is_empty()).then(|| Self::open(id, text, created_at))
    }

    /// Creates a new, not completed task from text that is already trimmed.
    pub fn open(id: TaskId, text: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.to_owned(),
            completed: false,
            created_at,
        }
    }

    pub fn created_on(&self, day: chrono::NaiveDate) -> bool {
        local_day(self.created_at) == day
    }
}

/// Produces ids from the wall clock, but never hands out the same id twice. When two tasks are
/// created within one millisecond the second one gets the next integer instead. Once `u64::MAX`
/// is taken, the smallest id not used by `existing` is handed out.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    last: u64,
}

impl TaskIdGenerator {
    /// Starts after the largest id that already exists.
    pub fn after<'a>(tasks: impl IntoIterator<Item = &'a TaskRecord>) -> Self {
        Self {
            last: tasks.into_iter().map(|v| v.id.0).max().unwrap_or(0),
        }
    }

    pub fn next(&mut self, moment: DateTime<Utc>, existing: &[TaskRecord]) -> TaskId {
        let candidate = u64::try_from(moment.timestamp_millis()).unwrap_or(0);
        let Some(following) = self.last.checked_add(1) else {
            return (0..)
                .map(TaskId)
                .find(|id| existing.iter().all(|v| v.id != *id))
                .unwrap_or(TaskId(0));
        };
        let id = candidate.max(following);
        self.last = id;
        TaskId(id)
    }
}
