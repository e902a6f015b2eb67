//! Shared helpers for integration tests.
//!
//! - `logger`: structured, phase-aware test logging
//! - `log_capture`: a tracing layer that records events for assertions

pub mod log_capture;
pub mod logger;
