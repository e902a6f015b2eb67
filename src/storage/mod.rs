//! Storage for configuration, secrets, and cached analysis results.

pub mod cache;
pub mod config;
pub mod paths;
pub mod secrets;

pub use cache::{CacheStats, ResultCache, cache_key};
pub use config::{
    Config, ConfigSource, ConfigSources, ENV_AI_TIMEOUT, ENV_CACHE_TTL, ENV_CONFIG,
    ENV_DEFAULT_PROVIDER, ResolvedConfig,
};
pub use paths::AppPaths;
pub use secrets::{EnvLookup, SecretResolver, VaultSettings};
