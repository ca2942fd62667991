//! CLI subcommand implementations.

pub mod classify;
pub mod history;
pub mod run;
