//!  Tasks are organized through [task_store::TaskStore] and [manager::TaskListManager].
//!  The basic idea is:
//!   - Everything is kept in a small string key-value store ([local_storage::LocalStorage]).
//!   - The task list is scoped to a local calendar day. The first load of a new day wipes it.
//!   - The manager owns the in-memory list and redraws the view after every change.

pub mod entities;
pub mod local_storage;
pub mod manager;
pub mod task_store;
