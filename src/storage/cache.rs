//! In-memory analysis result cache.
//!
//! Entries expire after a TTL and are never returned once expired. Expired
//! entries are purged lazily on lookup and by an interval-gated sweep.
//! Hit and miss counters are atomics so stats never contend with lookups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default minimum time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Deterministic key over the analysis inputs.
///
/// Format: `{language}:{analysis_type}:{show_all}:{sha256(code)}`.
#[must_use]
pub fn cache_key(language: &str, analysis_type: &str, show_all: bool, code: &str) -> String {
    let digest = hex::encode(Sha256::digest(code.as_bytes()));
    format!("{language}:{analysis_type}:{show_all}:{digest}")
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hits over lookups; 0.0 before the first lookup.
    pub hit_rate: f64,
    pub last_sweep: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry {
    suggestions: Vec<String>,
    stored_at: Instant,
}

#[derive(Debug)]
struct State {
    entries: HashMap<String, Entry>,
    last_sweep: Instant,
    last_sweep_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    sweep_interval: Duration,
    state: Mutex<State>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_SWEEP_INTERVAL)
    }
}

impl ResultCache {
    #[must_use]
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            ttl,
            sweep_interval,
            state: Mutex::new(State {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
                last_sweep_at: Utc::now(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live entry for `key`. An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        let mut state = self.lock();
        let live = match state.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.suggestions.clone()),
            Some(_) => {
                state.entries.remove(key);
                tracing::debug!(key, "Cache entry expired");
                None
            }
            None => None,
        };
        drop(state);

        if live.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        live
    }

    pub fn insert(&self, key: impl Into<String>, suggestions: Vec<String>) {
        self.lock().entries.insert(
            key.into(),
            Entry {
                suggestions,
                stored_at: Instant::now(),
            },
        );
    }

    /// Sweep expired entries if the sweep interval has passed.
    ///
    /// Returns the number removed, or `None` if the sweep was skipped.
    pub fn maybe_sweep(&self) -> Option<usize> {
        let mut state = self.lock();
        if state.last_sweep.elapsed() < self.sweep_interval {
            return None;
        }
        Some(self.sweep_locked(&mut state))
    }

    /// Sweep expired entries now.
    pub fn sweep(&self) -> usize {
        let mut state = self.lock();
        self.sweep_locked(&mut state)
    }

    fn sweep_locked(&self, state: &mut State) -> usize {
        let before = state.entries.len();
        let ttl = self.ttl;
        state.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        state.last_sweep = Instant::now();
        state.last_sweep_at = Utc::now();
        let removed = before - state.entries.len();
        tracing::debug!(removed, remaining = state.entries.len(), "Cache sweep");
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let (total_entries, last_sweep) = {
            let state = self.lock();
            (state.entries.len(), state.last_sweep_at)
        };
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };

        CacheStats {
            total_entries,
            hits,
            misses,
            hit_rate,
            last_sweep,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestions() -> Vec<String> {
        vec!["Refactor the nested loop into a helper".to_string()]
    }

    #[test]
    fn key_is_deterministic_and_input_sensitive() {
        let a = cache_key("python", "general", true, "x = 1");
        assert_eq!(a, cache_key("python", "general", true, "x = 1"));
        assert_ne!(a, cache_key("python", "general", false, "x = 1"));
        assert_ne!(a, cache_key("python", "security", true, "x = 1"));
        assert_ne!(a, cache_key("python", "general", true, "x = 2"));
        assert!(a.starts_with("python:general:true:"));
        assert_eq!(a.rsplit(':').next().unwrap().len(), 64);
    }

    #[test]
    fn hit_and_miss_are_counted() {
        let cache = ResultCache::default();
        assert!(cache.get("k").is_none());
        cache.insert("k", suggestions());
        assert_eq!(cache.get("k"), Some(suggestions()));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn expired_entries_are_never_returned() {
        let cache = ResultCache::new(Duration::ZERO, DEFAULT_SWEEP_INTERVAL);
        cache.insert("k", suggestions());
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn sweep_is_interval_gated() {
        let cache = ResultCache::new(Duration::ZERO, Duration::from_secs(3600));
        cache.insert("a", suggestions());
        cache.insert("b", suggestions());
        assert_eq!(cache.maybe_sweep(), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.sweep(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_interval_sweeps_every_time() {
        let cache = ResultCache::new(Duration::ZERO, Duration::ZERO);
        cache.insert("a", suggestions());
        assert_eq!(cache.maybe_sweep(), Some(1));
    }

    #[test]
    fn live_entries_survive_sweep() {
        let cache = ResultCache::new(Duration::from_secs(60), Duration::ZERO);
        cache.insert("a", suggestions());
        assert_eq!(cache.maybe_sweep(), Some(0));
        assert_eq!(cache.len(), 1);
    }
}
