//! CLI argument parsing and command dispatch.

pub mod analyze;
pub mod args;
pub mod complexity;
pub mod graph;
pub mod providers;
pub mod refactor;

pub use args::{Cli, Commands, OutputFormat};
