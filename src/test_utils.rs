//! Test utilities for codie.
//!
//! Provides a scripted provider backend with a call counter, temporary
//! source trees, and assertion macros shared by unit and integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use codie::test_utils::*;
//!
//! let backend = ScriptedBackend::succeeding("primary", &["Refactor the parser loop"]);
//! let calls = backend.call_counter();
//! let dir = TestDir::new();
//! dir.create_file("pkg/a.py", "def a():\n    b()\n");
//! ```

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::provider::SuggestionBackend;
use crate::error::{CodieError, Result};

// =============================================================================
// Scripted provider backend
// =============================================================================

/// One scripted provider outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Suggestions(Vec<String>),
    /// Succeeds with nothing to say.
    Empty,
    /// Fails with `ProviderUnavailable`, which trips the breaker.
    Unavailable,
    /// Fails with `Timeout`, which trips the breaker.
    Timeout,
    /// Fails with `ParseResponse`, which does not trip the breaker.
    Malformed,
    /// Waits, then gives the inner reply.
    Slow(Duration, Box<Reply>),
}

impl Reply {
    #[must_use]
    pub fn suggestions(items: &[&str]) -> Self {
        Self::Suggestions(items.iter().map(ToString::to_string).collect())
    }

    /// `reply`, delivered after `delay`.
    #[must_use]
    pub fn after(delay: Duration, reply: Self) -> Self {
        Self::Slow(delay, Box::new(reply))
    }
}

/// Provider backend that replays a script and counts calls.
///
/// Queued replies are consumed in order; once the queue is empty every call
/// gets the default reply.
#[derive(Debug)]
pub struct ScriptedBackend {
    name: String,
    queued: Mutex<VecDeque<Reply>>,
    default: Reply,
    calls: Arc<AtomicUsize>,
    output_tokens: u64,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new(name: &str, queued: Vec<Reply>, default: Reply) -> Self {
        Self {
            name: name.to_string(),
            queued: Mutex::new(queued.into()),
            default,
            calls: Arc::new(AtomicUsize::new(0)),
            output_tokens: 10,
        }
    }

    /// Always answers with `suggestions`.
    #[must_use]
    pub fn succeeding(name: &str, suggestions: &[&str]) -> Self {
        Self::new(name, Vec::new(), Reply::suggestions(suggestions))
    }

    /// Always fails with `ProviderUnavailable`.
    #[must_use]
    pub fn failing(name: &str) -> Self {
        Self::new(name, Vec::new(), Reply::Unavailable)
    }

    /// Shared counter, for reading after the backend is boxed.
    #[must_use]
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Boxed for `ProviderManager::with_backends`.
    #[must_use]
    pub fn boxed(self) -> Box<dyn SuggestionBackend> {
        Box::new(self)
    }

    fn next_reply(&self) -> Reply {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl SuggestionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn request(&self, _code: &str, _language: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut reply = self.next_reply();
        loop {
            break match reply {
                Reply::Slow(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                    continue;
                }
                Reply::Suggestions(items) => Ok(items),
                Reply::Empty => Ok(Vec::new()),
                Reply::Unavailable => Err(CodieError::unavailable(&self.name, "scripted outage")),
                Reply::Timeout => Err(CodieError::Timeout {
                    provider: self.name.clone(),
                    seconds: 30,
                }),
                Reply::Malformed => Err(CodieError::ParseResponse(format!(
                    "{}: scripted malformed body",
                    self.name
                ))),
            };
        }
    }

    fn output_tokens_per_suggestion(&self) -> u64 {
        self.output_tokens
    }
}

// =============================================================================
// Temporary Directories
// =============================================================================

/// An isolated temporary directory removed on drop.
///
/// # Examples
///
/// ```rust,ignore
/// let dir = TestDir::new();
/// dir.create_file("src/app.py", "def main():\n    pass\n");
/// assert!(dir.file_exists("src/app.py"));
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file, and any missing parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Source Trees
// =============================================================================

/// Two Python modules where `caller` calls `callee`.
#[must_use]
pub fn make_call_pair_repo() -> TestDir {
    let dir = TestDir::new();
    dir.create_file("app/a.py", "def caller():\n    return callee()\n");
    dir.create_file("app/b.py", "def callee():\n    return 1\n");
    dir
}

/// A mixed-language tree with code inside directories that must be skipped.
#[must_use]
pub fn make_mixed_repo() -> TestDir {
    let dir = TestDir::new();
    dir.create_file(
        "src/service.py",
        "class Service:\n    def handle(self, req):\n        if req and req.ok:\n            return self.render(req)\n        return None\n\n    def render(self, req):\n        return str(req)\n",
    );
    dir.create_file(
        "web/app.js",
        "function start() {\n  const cfg = load();\n  return cfg || {};\n}\nconst load = () => ({ port: 80 });\n",
    );
    dir.create_file("web/types.ts", "export function parse(s: string): number {\n  return Number(s);\n}\n");
    dir.create_file("node_modules/dep/index.js", "function vendored() { start(); }\n");
    dir.create_file(".venv/lib/site.py", "def hidden():\n    handle()\n");
    dir.create_file("build/out.js", "function bundled() {}\n");
    dir.create_file("README.md", "# not code\n");
    dir
}

/// Python source with `branches` sequential `if` statements in one function.
#[must_use]
pub fn make_branchy_python(name: &str, branches: usize) -> String {
    let mut source = format!("def {name}(x):\n");
    for i in 0..branches {
        source.push_str(&format!("    if x == {i}:\n        return {i}\n"));
    }
    source.push_str("    return -1\n");
    source
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string parses as JSON.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {
        let json = $json;
        if let Err(e) = serde_json::from_str::<serde_json::Value>(json) {
            panic!("Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}", e, json);
        }
    };
}

/// Assert approximate floating point equality (default epsilon 1e-9).
#[macro_export]
macro_rules! assert_float_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_float_eq!($left, $right, 1e-9)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = $epsilon;
        assert!(
            (left - right).abs() < epsilon,
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    };
}
