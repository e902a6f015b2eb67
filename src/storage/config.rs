//! Configuration file loading and resolution.
//!
//! Loads configuration from:
//! - Linux: `~/.config/codie/config.toml`
//! - macOS: `~/Library/Application Support/dev.codie.codie/config.toml`
//! - Windows: `%APPDATA%/codie/codie/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. Environment variables
//! 2. Config file
//! 3. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `CODIE_CONFIG`: Override config file path
//! - `AI_TIMEOUT`: Provider request timeout in seconds
//! - `DEFAULT_AI_PROVIDER`: Provider tried first (gemini, huggingface)
//! - `CODIE_CACHE_TTL`: Analysis cache TTL in seconds

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::core::circuit_breaker::BreakerSettings;
use crate::core::provider::ProviderKind;
use crate::error::{CodieError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "CODIE_CONFIG";
/// Environment variable for provider timeout in seconds.
pub const ENV_AI_TIMEOUT: &str = "AI_TIMEOUT";
/// Environment variable for the preferred provider.
pub const ENV_DEFAULT_PROVIDER: &str = "DEFAULT_AI_PROVIDER";
/// Environment variable for analysis cache TTL in seconds.
pub const ENV_CACHE_TTL: &str = "CODIE_CACHE_TTL";

/// Directories never descended into by the graph builder.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "venv",
    ".venv",
    "env",
    "site-packages",
    "node_modules",
    "__pycache__",
    "dist",
    "build",
    "target",
];

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Configuration after merging env vars over the config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// File (or default) configuration.
    pub config: Config,
    /// Provider moved to the front of the preference order.
    pub default_provider: Option<ProviderKind>,
    /// Provider request timeout.
    pub ai_timeout: Duration,
    /// Analysis cache TTL.
    pub cache_ttl: Duration,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each resolved value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub default_provider: ConfigSource,
    pub ai_timeout: ConfigSource,
    pub cache_ttl: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve from the process environment and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or an
    /// environment value cannot be parsed.
    pub fn resolve() -> Result<Self> {
        let config = match std::env::var(ENV_CONFIG) {
            Ok(path) => Config::load_from(Path::new(&path))?,
            Err(_) => Config::load()?,
        };
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Resolve against an explicit config and environment lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or an environment value
    /// cannot be parsed.
    pub fn resolve_with(config: Config, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        config.validate()?;
        let env = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut sources = ConfigSources::default();

        let default_provider = if let Some(name) = env(ENV_DEFAULT_PROVIDER) {
            sources.default_provider = ConfigSource::Env;
            Some(parse_default_provider(ENV_DEFAULT_PROVIDER, &name)?)
        } else if let Some(name) = &config.ai.default_provider {
            sources.default_provider = ConfigSource::ConfigFile;
            Some(parse_default_provider("ai.default_provider", name)?)
        } else {
            None
        };

        let ai_timeout = if let Some(raw) = env(ENV_AI_TIMEOUT) {
            sources.ai_timeout = ConfigSource::Env;
            let seconds = parse_seconds(ENV_AI_TIMEOUT, &raw)?;
            check_timeout(ENV_AI_TIMEOUT, seconds)?;
            Duration::from_secs(seconds)
        } else {
            sources.ai_timeout = file_or_default(
                config.ai.timeout_seconds,
                AiConfig::default().timeout_seconds,
            );
            Duration::from_secs(config.ai.timeout_seconds)
        };

        let cache_ttl = if let Some(raw) = env(ENV_CACHE_TTL) {
            sources.cache_ttl = ConfigSource::Env;
            Duration::from_secs(parse_seconds(ENV_CACHE_TTL, &raw)?)
        } else {
            sources.cache_ttl = file_or_default(
                config.analysis.cache_ttl_seconds,
                AnalysisConfig::default().cache_ttl_seconds,
            );
            Duration::from_secs(config.analysis.cache_ttl_seconds)
        };

        tracing::debug!(
            default_provider = ?default_provider,
            ai_timeout_secs = ai_timeout.as_secs(),
            cache_ttl_secs = cache_ttl.as_secs(),
            "Configuration resolved"
        );

        Ok(Self {
            config,
            default_provider,
            ai_timeout,
            cache_ttl,
            sources,
        })
    }

    /// Breaker thresholds from the `[breaker]` section.
    #[must_use]
    pub const fn breaker_settings(&self) -> BreakerSettings {
        BreakerSettings {
            failure_threshold: self.config.breaker.failure_threshold,
            recovery_timeout: Duration::from_secs(self.config.breaker.recovery_timeout_seconds),
        }
    }

    /// Timeout for one provider: its own setting, else the resolved AI timeout.
    #[must_use]
    pub fn provider_timeout(&self, kind: ProviderKind) -> Duration {
        self.config
            .ai
            .provider(kind)
            .and_then(|p| p.timeout_seconds)
            .map_or(self.ai_timeout, Duration::from_secs)
    }
}

fn file_or_default(value: u64, default: u64) -> ConfigSource {
    if value == default {
        ConfigSource::Default
    } else {
        ConfigSource::ConfigFile
    }
}

fn parse_seconds(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|e| CodieError::ConfigInvalid {
        key: key.to_string(),
        value: raw.to_string(),
        message: e.to_string(),
    })
}

// =============================================================================
// File Configuration
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AI provider settings.
    pub ai: AiConfig,
    /// Circuit breaker thresholds.
    pub breaker: BreakerConfig,
    /// Analysis cache and filtering.
    pub analysis: AnalysisConfig,
    /// Call-graph builder settings.
    pub graph: GraphConfig,
}

/// AI provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Provider tried first.
    pub default_provider: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    pub gemini: ProviderSettings,
    pub huggingface: ProviderSettings,
}

/// Settings for a specific provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Whether this provider is registered.
    pub enabled: bool,
    /// Custom API endpoint.
    pub endpoint: Option<String>,
    /// Relative weight reported in status.
    pub weight: Option<f64>,
    /// Overrides `ai.timeout_seconds` for this provider.
    pub timeout_seconds: Option<u64>,
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout_seconds: u64,
}

/// Analysis cache and suggestion filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cache_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
    /// Above this complexity every suggestion counts as high impact.
    pub high_complexity_threshold: u32,
    pub max_suggestions: usize,
}

/// Call-graph builder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub max_hotspots: usize,
    pub excluded_dirs: Vec<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            timeout_seconds: 30,
            gemini: ProviderSettings::default(),
            huggingface: ProviderSettings::default(),
        }
    }
}

impl AiConfig {
    /// Per-provider settings; `None` for the mock.
    #[must_use]
    pub const fn provider(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        match kind {
            ProviderKind::Gemini => Some(&self.gemini),
            ProviderKind::HuggingFace => Some(&self.huggingface),
            ProviderKind::Mock => None,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            weight: None,
            timeout_seconds: None,
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_seconds: 60,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 3600,
            cleanup_interval_seconds: 300,
            high_complexity_threshold: 7,
            max_suggestions: 5,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_hotspots: 20,
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error only if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().config_file())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CodieError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Validate configuration values.
    ///
    /// Checks that:
    /// - The default provider name is known
    /// - Timeouts are within 1-300 seconds
    /// - Thresholds and limits are non-zero
    /// - Weights are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.ai.default_provider {
            parse_default_provider("ai.default_provider", name)?;
        }

        check_timeout("ai.timeout_seconds", self.ai.timeout_seconds)?;
        for kind in ProviderKind::REMOTE {
            let Some(settings) = self.ai.provider(*kind) else {
                continue;
            };
            if let Some(timeout) = settings.timeout_seconds {
                check_timeout(&format!("ai.{kind}.timeout_seconds"), timeout)?;
            }
            if let Some(weight) = settings.weight
                && (!weight.is_finite() || weight < 0.0)
            {
                return Err(CodieError::ConfigInvalid {
                    key: format!("ai.{kind}.weight"),
                    value: weight.to_string(),
                    message: "weight must be a non-negative number".to_string(),
                });
            }
        }

        check_nonzero(
            "breaker.failure_threshold",
            u64::from(self.breaker.failure_threshold),
        )?;
        check_nonzero("analysis.max_suggestions", self.analysis.max_suggestions as u64)?;
        check_nonzero("graph.max_hotspots", self.graph.max_hotspots as u64)?;

        Ok(())
    }
}

/// A preferred provider must be a remote one; the mock only ever stands in
/// when no remote provider is registered.
fn parse_default_provider(key: &str, name: &str) -> Result<ProviderKind> {
    match ProviderKind::from_name(name) {
        Ok(kind) if kind != ProviderKind::Mock => Ok(kind),
        _ => Err(CodieError::ConfigInvalid {
            key: key.to_string(),
            value: name.to_string(),
            message: "valid providers: gemini, huggingface".to_string(),
        }),
    }
}

fn check_timeout(key: &str, seconds: u64) -> Result<()> {
    if seconds == 0 || seconds > 300 {
        return Err(CodieError::ConfigInvalid {
            key: key.to_string(),
            value: seconds.to_string(),
            message: "timeout must be between 1 and 300 seconds".to_string(),
        });
    }
    Ok(())
}

fn check_nonzero(key: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(CodieError::ConfigInvalid {
            key: key.to_string(),
            value: "0".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.ai.timeout_seconds, 30);
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.analysis.cache_ttl_seconds, 3600);
        assert_eq!(config.analysis.cleanup_interval_seconds, 300);
        assert_eq!(config.graph.max_hotspots, 20);
        assert!(config.ai.gemini.enabled);
        assert!(config.graph.excluded_dirs.iter().any(|d| d == "node_modules"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_missing_file_returns_default() {
        let config = Config::load_from(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.ai.timeout_seconds, 30);
    }

    #[test]
    fn load_valid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[ai]
default_provider = "huggingface"
timeout_seconds = 12

[ai.gemini]
enabled = false

[ai.huggingface]
endpoint = "http://localhost:9999/model"
weight = 0.5

[breaker]
failure_threshold = 2

[analysis]
max_suggestions = 3
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.ai.default_provider.as_deref(), Some("huggingface"));
        assert_eq!(config.ai.timeout_seconds, 12);
        assert!(!config.ai.gemini.enabled);
        assert!(config.ai.huggingface.enabled);
        assert_eq!(
            config.ai.huggingface.endpoint.as_deref(),
            Some("http://localhost:9999/model")
        );
        assert_eq!(config.breaker.failure_threshold, 2);
        assert_eq!(config.breaker.recovery_timeout_seconds, 60);
        assert_eq!(config.analysis.max_suggestions, 3);
        assert_eq!(config.analysis.cache_ttl_seconds, 3600);
    }

    #[test]
    fn load_invalid_toml_returns_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, CodieError::ConfigParse { .. }));
        assert_eq!(err.error_code(), "CODIE-C001");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let config: Config = toml::from_str("[ai]\nfuture_flag = true\n").unwrap();
        assert_eq!(config.ai.timeout_seconds, 30);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.ai.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ai.default_provider = Some("openai".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("ai.default_provider"));

        let mut config = Config::default();
        config.ai.default_provider = Some("mock".to_string());
        assert!(matches!(
            config.validate(),
            Err(CodieError::ConfigInvalid { ref key, .. }) if key == "ai.default_provider"
        ));

        let mut config = Config::default();
        config.breaker.failure_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ai.gemini.weight = Some(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_resolve_with_default_sources() {
        let resolved = ResolvedConfig::resolve_with(Config::default(), env_of(&[])).unwrap();
        assert_eq!(resolved.default_provider, None);
        assert_eq!(resolved.ai_timeout, Duration::from_secs(30));
        assert_eq!(resolved.cache_ttl, Duration::from_secs(3600));
        assert_eq!(resolved.sources.ai_timeout, ConfigSource::Default);
        assert_eq!(resolved.sources.cache_ttl, ConfigSource::Default);
    }

    #[test]
    fn mock_is_not_a_preferable_provider() {
        let err = ResolvedConfig::resolve_with(Config::default(), env_of(&[(ENV_DEFAULT_PROVIDER, "mock")]))
            .unwrap_err();
        assert_eq!(err.error_code(), "CODIE-C002");
        assert!(err.to_string().contains(ENV_DEFAULT_PROVIDER));
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config::default();
        config.ai.default_provider = Some("gemini".to_string());
        config.ai.timeout_seconds = 20;

        let resolved = ResolvedConfig::resolve_with(
            config,
            env_of(&[
                (ENV_DEFAULT_PROVIDER, "huggingface"),
                (ENV_AI_TIMEOUT, "5"),
                (ENV_CACHE_TTL, "0"),
            ]),
        )
        .unwrap();

        assert_eq!(resolved.default_provider, Some(ProviderKind::HuggingFace));
        assert_eq!(resolved.sources.default_provider, ConfigSource::Env);
        assert_eq!(resolved.ai_timeout, Duration::from_secs(5));
        assert_eq!(resolved.cache_ttl, Duration::ZERO);
    }

    #[test]
    fn file_values_report_file_source() {
        let mut config = Config::default();
        config.ai.default_provider = Some("gemini".to_string());
        config.ai.timeout_seconds = 20;

        let resolved = ResolvedConfig::resolve_with(config, env_of(&[])).unwrap();
        assert_eq!(resolved.default_provider, Some(ProviderKind::Gemini));
        assert_eq!(resolved.sources.default_provider, ConfigSource::ConfigFile);
        assert_eq!(resolved.sources.ai_timeout, ConfigSource::ConfigFile);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let resolved =
            ResolvedConfig::resolve_with(Config::default(), env_of(&[(ENV_AI_TIMEOUT, "  ")]))
                .unwrap();
        assert_eq!(resolved.sources.ai_timeout, ConfigSource::Default);
    }

    #[test]
    fn unparsable_env_is_config_error() {
        let err = ResolvedConfig::resolve_with(
            Config::default(),
            env_of(&[(ENV_AI_TIMEOUT, "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, CodieError::ConfigInvalid { ref key, .. } if key == ENV_AI_TIMEOUT));
    }

    #[test]
    fn provider_timeout_prefers_provider_setting() {
        let mut config = Config::default();
        config.ai.huggingface.timeout_seconds = Some(7);
        let resolved = ResolvedConfig::resolve_with(config, env_of(&[])).unwrap();
        assert_eq!(
            resolved.provider_timeout(ProviderKind::HuggingFace),
            Duration::from_secs(7)
        );
        assert_eq!(
            resolved.provider_timeout(ProviderKind::Gemini),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn config_source_display() {
        assert_eq!(ConfigSource::Env.to_string(), "environment variable");
        assert_eq!(ConfigSource::ConfigFile.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
