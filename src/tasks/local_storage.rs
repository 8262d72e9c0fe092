use std::{
    collections::BTreeMap,
    future::Future,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Result;
use tracing::warn;

use crate::fs::operations::{read_locked, update_locked};

/// Interface for abstracting a persistent string key-value store.
pub trait LocalStorage {
    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>>>;

    /// Overwrites the value stored under `key`.
    fn set_item(&self, key: &str, value: String) -> impl Future<Output = Result<()>>;

    fn remove_item(&self, key: &str) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> LocalStorage for T
where
    T::Target: LocalStorage,
{
    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>>> {
        self.deref().get_item(key)
    }

    fn set_item(&self, key: &str, value: String) -> impl Future<Output = Result<()>> {
        self.deref().set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> impl Future<Output = Result<()>> {
        self.deref().remove_item(key)
    }
}

type Entries = BTreeMap<String, String>;

/// The main realization of [LocalStorage]. All entries live in a single JSON object file.
pub struct FileLocalStorage {
    path: PathBuf,
}

impl FileLocalStorage {
    pub const FILE_NAME: &'static str = "local_storage.json";

    pub fn new(application_dir: &Path) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(application_dir)?;

        Ok(Self {
            path: application_dir.join(Self::FILE_NAME),
        })
    }

    fn parse_entries(path: &Path, contents: Option<String>) -> Entries {
        let Some(contents) = contents else {
            return Entries::new();
        };
        match serde_json::from_str::<Entries>(&contents) {
            Ok(v) => v,
            Err(e) => {
                // A broken file is dropped instead of locking the user out of their tasks.
                warn!("Storage file {path:?} is corrupted, treating it as empty: {e}");
                Entries::new()
            }
        }
    }

    async fn modify(&self, change: impl FnOnce(&mut Entries)) -> Result<()> {
        update_locked(&self.path, |contents| {
            let mut entries = Self::parse_entries(&self.path, contents);
            change(&mut entries);
            Ok(serde_json::to_string_pretty(&entries)?)
        })
        .await
    }
}

impl LocalStorage for FileLocalStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let contents = read_locked(&self.path).await?;
        let mut entries = Self::parse_entries(&self.path, contents);
        Ok(entries.remove(key))
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.modify(|entries| {
            entries.insert(key.to_owned(), value);
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.modify(|entries| {
            entries.remove(key);
        })
        .await
    }
}
