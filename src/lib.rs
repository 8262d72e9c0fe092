//! Small terminal dashboard for the start of a working day: a greeting, today's to-do list and the
//! latest deep work hours from a spreadsheet endpoint.
//! Tasks live only for the day they were created on, the list is cleared on the first start of a
//! new day.
//!

pub mod cli;
pub mod dashboard;
pub mod fs;
pub mod tasks;
pub mod utils;
pub mod view;
