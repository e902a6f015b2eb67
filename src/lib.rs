//! codie - code analysis core.
//!
//! Cyclomatic complexity scoring, AI-backed improvement suggestions with
//! circuit-broken provider fallback, and call-graph hotspot ranking for
//! Python, JavaScript, and TypeScript repositories.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod providers;
pub mod render;
pub mod storage;

/// Test utilities - included in test builds or with the `test-utils` feature.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{CodieError, ExitCode, Result};
