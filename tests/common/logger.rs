//! Structured logging for integration tests.
//!
//! `TestLogger` prints phase-tagged progress lines to stderr, and JSON lines
//! when `TEST_LOG_JSON` is set, so CI logs show where a failing test stopped.
//!
//! ```rust,ignore
//! let log = TestLogger::new("graph_builds_edges");
//! log.phase("setup");
//! log.info("tree created");
//! log.finish_ok();
//! ```
//!
//! Environment:
//! - `TEST_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//! - `TEST_LOG_JSON`: "1" or "true" for JSON lines
#![allow(dead_code)]

use std::fmt::Display;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    timestamp: DateTime<Utc>,
    level: LogLevel,
    test: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phase: Option<&'a str>,
    elapsed_ms: u128,
}

struct Settings {
    min_level: LogLevel,
    json: bool,
}

fn settings() -> &'static Settings {
    static SETTINGS: OnceLock<Settings> = OnceLock::new();
    SETTINGS.get_or_init(|| Settings {
        min_level: std::env::var("TEST_LOG_LEVEL")
            .ok()
            .and_then(|s| LogLevel::parse(&s))
            .unwrap_or(LogLevel::Info),
        json: std::env::var("TEST_LOG_JSON").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
    })
}

/// Per-test logger with phase tracking and elapsed time.
pub struct TestLogger {
    name: String,
    started: Instant,
    phase: Mutex<Option<String>>,
}

impl TestLogger {
    pub fn new(name: &str) -> Self {
        let logger = Self {
            name: name.to_string(),
            started: Instant::now(),
            phase: Mutex::new(None),
        };
        logger.log(LogLevel::Debug, "start");
        logger
    }

    pub fn phase(&self, phase: &str) {
        *self.phase.lock().unwrap() = Some(phase.to_string());
        self.log(LogLevel::Debug, &format!("phase: {phase}"));
    }

    pub fn trace(&self, message: impl Display) {
        self.log(LogLevel::Trace, &message.to_string());
    }

    pub fn debug(&self, message: impl Display) {
        self.log(LogLevel::Debug, &message.to_string());
    }

    pub fn info(&self, message: impl Display) {
        self.log(LogLevel::Info, &message.to_string());
    }

    pub fn warn(&self, message: impl Display) {
        self.log(LogLevel::Warn, &message.to_string());
    }

    pub fn finish_ok(&self) {
        self.log(LogLevel::Info, "passed");
    }

    pub fn finish_err(&self, reason: impl Display) {
        self.log(LogLevel::Error, &format!("failed: {reason}"));
    }

    fn log(&self, level: LogLevel, message: &str) {
        let settings = settings();
        if level < settings.min_level {
            return;
        }
        let phase = self.phase.lock().unwrap().clone();
        let elapsed_ms = self.started.elapsed().as_millis();

        if settings.json {
            let entry = LogEntry {
                timestamp: Utc::now(),
                level,
                test: &self.name,
                message,
                phase: phase.as_deref(),
                elapsed_ms,
            };
            if let Ok(line) = serde_json::to_string(&entry) {
                eprintln!("{line}");
            }
        } else {
            let phase = phase.map(|p| format!("[{p}] ")).unwrap_or_default();
            eprintln!("[{level:<5}] {} {phase}{message} ({elapsed_ms}ms)", self.name);
        }
    }
}
