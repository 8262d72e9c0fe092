use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::utils::{clock::Clock, time::date_to_day_key};

use super::{entities::TaskRecord, local_storage::LocalStorage};

/// Storage entry holding the serialized array of today's tasks.
pub const TASKS_KEY: &str = "daybrief.tasks";
/// Storage entry holding the day of the last reset, see [date_to_day_key].
pub const LAST_RESET_KEY: &str = "daybrief.last_reset";

/// Day-scoped view over a [LocalStorage]. Only tasks created on the current local day are ever
/// returned or written.
pub struct TaskStore<S: LocalStorage> {
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S: LocalStorage> TaskStore<S> {
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Loads today's tasks. Any problem with storage results in an empty list, the dashboard has to
    /// stay usable even if the stored data is broken.
    pub async fn load_today(&self) -> Vec<TaskRecord> {
        let stored = match self.storage.get_item(TASKS_KEY).await {
            Ok(Some(v)) => v,
            Ok(None) => return vec![],
            Err(e) => {
                warn!("Failed to read stored tasks: {e:?}");
                return vec![];
            }
        };

        let tasks = match serde_json::from_str::<Vec<TaskRecord>>(&stored) {
            Ok(v) => v,
            Err(e) => {
                warn!("Stored tasks are not valid json, starting empty: {e}");
                return vec![];
            }
        };

        let today = self.clock.today();
        let loaded = tasks.len();
        let tasks: Vec<_> = tasks.into_iter().filter(|v| v.created_on(today)).collect();
        if tasks.len() != loaded {
            debug!("Dropped {} stale tasks", loaded - tasks.len());
        }
        tasks
    }

    /// Overwrites stored tasks with today's subset of `tasks`.
    pub async fn save_today(&self, tasks: &[TaskRecord]) -> Result<()> {
        let today = self.clock.today();
        let tasks: Vec<_> = tasks.iter().filter(|v| v.created_on(today)).collect();
        let serialized = serde_json::to_string(&tasks)?;
        self.storage.set_item(TASKS_KEY, serialized).await
    }

    /// Clears stored tasks when the last reset happened on another day. Returns `true` if a reset
    /// was performed, in which case any tasks held in memory are stale.
    pub async fn reset_if_new_day(&self) -> Result<bool> {
        let today = date_to_day_key(self.clock.today());
        let last_reset = self.storage.get_item(LAST_RESET_KEY).await?;

        if last_reset.as_deref() == Some(today.as_str()) {
            return Ok(false);
        }

        info!("New day {today}, previous reset {last_reset:?}. Clearing tasks");
        self.storage.remove_item(TASKS_KEY).await?;
        self.storage.set_item(LAST_RESET_KEY, today).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{Duration, Utc};

    use crate::{
        tasks::{
            entities::{TaskId, TaskRecord},
            local_storage::memory::MemoryStorage,
        },
        utils::{clock::test_clock::FixedClock, clock::Clock, logging::TEST_LOGGING},
    };

    use super::{TaskStore, LAST_RESET_KEY, TASKS_KEY};

    fn task(id: u64, text: &str, clock: &FixedClock) -> TaskRecord {
        TaskRecord::new_opt(TaskId(id), text, clock.now().with_timezone(&Utc)).unwrap()
    }

    #[tokio::test]
    async fn test_save_load_round_trip() -> Result<()> {
        *TEST_LOGGING;
        let clock = FixedClock::at(2018, 7, 4, 9);
        let store = TaskStore::new(MemoryStorage::default(), Arc::new(clock.clone()));

        let mut done = task(2, "done", &clock);
        done.completed = true;
        let tasks = vec![task(1, "open", &clock), done];

        store.save_today(&tasks).await?;
        assert_eq!(store.load_today().await, tasks);
        Ok(())
    }

    #[tokio::test]
    async fn test_round_trip_keeps_only_today() -> Result<()> {
        let clock = FixedClock::at(2018, 7, 4, 9);
        let yesterday = FixedClock::at(2018, 7, 3, 9);
        let store = TaskStore::new(MemoryStorage::default(), Arc::new(clock.clone()));

        let today_task = task(2, "today", &clock);
        store
            .save_today(&[task(1, "yesterday", &yesterday), today_task.clone()])
            .await?;

        assert_eq!(store.load_today().await, vec![today_task]);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_drops_stale_records() -> Result<()> {
        let clock = FixedClock::at(2018, 7, 4, 9);
        let yesterday = FixedClock::at(2018, 7, 3, 22);
        let stored = serde_json::to_string(&[task(1, "old", &yesterday), task(2, "new", &clock)])?;
        let store = TaskStore::new(
            MemoryStorage::with_entries([(TASKS_KEY, stored)]),
            Arc::new(clock.clone()),
        );

        let loaded = store.load_today().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "new");
        Ok(())
    }

    #[tokio::test]
    async fn test_load_swallows_bad_data() {
        let clock = Arc::new(FixedClock::at(2018, 7, 4, 9));

        let corrupted = TaskStore::new(
            MemoryStorage::with_entries([(TASKS_KEY, "[{\"id\":".to_owned())]),
            clock.clone(),
        );
        assert!(corrupted.load_today().await.is_empty());

        let missing = TaskStore::new(MemoryStorage::default(), clock.clone());
        assert!(missing.load_today().await.is_empty());

        let unavailable = TaskStore::new(MemoryStorage::unavailable(), clock);
        assert!(unavailable.load_today().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_on_new_day() -> Result<()> {
        let clock = FixedClock::at(2018, 7, 4, 9);
        let yesterday = FixedClock::at(2018, 7, 3, 9);
        let stored = serde_json::to_string(&[task(1, "old", &yesterday)])?;
        let storage = MemoryStorage::with_entries([
            (TASKS_KEY, stored),
            (LAST_RESET_KEY, "2018-07-03".to_owned()),
        ]);
        let store = TaskStore::new(&storage, Arc::new(clock));

        assert!(store.reset_if_new_day().await?);
        assert_eq!(storage.get(TASKS_KEY), None);
        assert_eq!(storage.get(LAST_RESET_KEY).as_deref(), Some("2018-07-04"));
        assert!(store.load_today().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_only_once_per_day() -> Result<()> {
        let clock = FixedClock::at(2018, 7, 4, 9);
        let storage = MemoryStorage::default();
        let store = TaskStore::new(&storage, Arc::new(clock.clone()));

        assert!(store.reset_if_new_day().await?);

        let tasks = vec![task(1, "keep me", &clock)];
        store.save_today(&tasks).await?;

        clock.advance(Duration::hours(10));
        assert!(!store.reset_if_new_day().await?);
        assert_eq!(store.load_today().await, tasks);

        clock.advance(Duration::hours(6));
        assert!(store.reset_if_new_day().await?);
        assert!(store.load_today().await.is_empty());
        assert_eq!(storage.get(LAST_RESET_KEY).as_deref(), Some("2018-07-05"));
        Ok(())
    }
}
