//! Analyzer caching and heuristic fallback with scripted providers.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use codie::core::analyzer::{AiAnalyzer, AnalysisType, AnalyzerSettings};
use codie::core::circuit_breaker::BreakerSettings;
use codie::core::manager::ProviderManager;
use codie::storage::ResultCache;
use codie::test_utils::{Reply, ScriptedBackend};

use common::log_capture::TestLogCapture;
use common::logger::TestLogger;

const SNIPPET: &str = "def load(path):\n    with open(path) as fh:\n        return fh.read()\n";

fn analyzer_over(backends: Vec<ScriptedBackend>, ttl: Duration) -> AiAnalyzer {
    let manager = ProviderManager::with_backends(
        backends.into_iter().map(ScriptedBackend::boxed).collect(),
        BreakerSettings::default(),
    );
    AiAnalyzer::new(
        Arc::new(manager),
        ResultCache::new(ttl, Duration::from_secs(300)),
        AnalyzerSettings::default(),
    )
}

#[tokio::test]
async fn repeated_analysis_is_served_from_cache() {
    let log = TestLogger::new("repeated_analysis_is_served_from_cache");
    let capture = TestLogCapture::start();

    log.phase("setup");
    let backend = ScriptedBackend::succeeding(
        "primary",
        &["1. Refactor file loading into a helper", "- Document the return type"],
    );
    let calls = backend.call_counter();
    let analyzer = analyzer_over(vec![backend], Duration::from_secs(3600));

    log.phase("execute");
    let first = analyzer
        .analyze_code(SNIPPET, "python", true, AnalysisType::General)
        .await
        .unwrap();
    let second = analyzer
        .analyze_code(SNIPPET, "python", true, AnalysisType::General)
        .await
        .unwrap();

    log.phase("verify");
    assert_eq!(first, vec!["Refactor file loading into a helper", "Document the return type"]);
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    capture.assert_logged("Returning cached analysis");

    let metrics = analyzer.analysis_metrics();
    assert_eq!(metrics.analysis_count, 2);
    assert_eq!(metrics.cache_stats.hits, 1);
    assert_eq!(metrics.cache_stats.misses, 1);
    log.finish_ok();
}

#[tokio::test]
async fn cache_key_separates_flags_and_analysis_type() {
    let backend = ScriptedBackend::succeeding("primary", &["Optimize the read for large files"]);
    let calls = backend.call_counter();
    let analyzer = analyzer_over(vec![backend], Duration::from_secs(3600));

    analyzer.analyze_code(SNIPPET, "python", true, AnalysisType::General).await.unwrap();
    analyzer.analyze_code(SNIPPET, "python", false, AnalysisType::General).await.unwrap();
    analyzer.analyze_code(SNIPPET, "python", true, AnalysisType::Security).await.unwrap();
    analyzer.analyze_code(SNIPPET, "python", true, AnalysisType::Security).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(analyzer.analysis_metrics().cache_stats.total_entries, 3);
}

#[tokio::test]
async fn expired_entries_are_recomputed() {
    let backend = ScriptedBackend::succeeding("primary", &["Simplify the control flow here"]);
    let calls = backend.call_counter();
    let analyzer = analyzer_over(vec![backend], Duration::from_millis(30));

    analyzer.analyze_code(SNIPPET, "python", true, AnalysisType::General).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    analyzer.analyze_code(SNIPPET, "python", true, AnalysisType::General).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn all_providers_failing_degrades_to_heuristics_without_caching() {
    let capture = TestLogCapture::start();
    let first = ScriptedBackend::failing("first");
    let second = ScriptedBackend::new("second", Vec::new(), Reply::Timeout);
    let first_calls = first.call_counter();
    let analyzer = analyzer_over(vec![first, second], Duration::from_secs(3600));

    let out = analyzer
        .analyze_code(SNIPPET, "python", false, AnalysisType::General)
        .await
        .unwrap();
    assert!(!out.is_empty());
    assert!(out.len() <= 3);
    assert!(out.iter().any(|s| s.contains("type hints")), "{out:?}");
    capture.assert_logged("using heuristics");

    analyzer
        .analyze_code(SNIPPET, "python", false, AnalysisType::General)
        .await
        .unwrap();
    assert_eq!(first_calls.load(Ordering::SeqCst), 2);
    assert_eq!(analyzer.analysis_metrics().cache_stats.total_entries, 0);
}

#[tokio::test]
async fn recovery_after_outage_populates_cache() {
    let backend = ScriptedBackend::new(
        "primary",
        vec![Reply::Unavailable],
        Reply::suggestions(&["Refactor the reader to stream lines"]),
    );
    let calls = backend.call_counter();
    let analyzer = analyzer_over(vec![backend], Duration::from_secs(3600));

    let degraded = analyzer
        .analyze_code(SNIPPET, "python", true, AnalysisType::Performance)
        .await
        .unwrap();
    let recovered = analyzer
        .analyze_code(SNIPPET, "python", true, AnalysisType::Performance)
        .await
        .unwrap();
    let cached = analyzer
        .analyze_code(SNIPPET, "python", true, AnalysisType::Performance)
        .await
        .unwrap();

    assert_ne!(degraded, recovered);
    assert_eq!(recovered, vec!["Refactor the reader to stream lines"]);
    assert_eq!(recovered, cached);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
