//! Providers command implementation.

use crate::cli::args::OutputFormat;
use crate::core::manager::ProviderManager;
use crate::core::models::ProvidersPayload;
use crate::error::Result;
use crate::render;
use crate::storage::{ResolvedConfig, SecretResolver};

/// Execute the providers command.
pub async fn execute(format: OutputFormat, pretty: bool) -> Result<()> {
    let config = ResolvedConfig::resolve()?;
    let secrets = SecretResolver::from_env();
    let payload = status(&config, &secrets).await?;
    println!("{}", render::render_providers(&payload, format, pretty)?);
    Ok(())
}

/// Registered providers and their state, without calling any provider.
///
/// # Errors
///
/// Returns an error if a provider client cannot be built.
pub async fn status(config: &ResolvedConfig, secrets: &SecretResolver) -> Result<ProvidersPayload> {
    let manager = ProviderManager::from_config(config, secrets).await?;
    Ok(ProvidersPayload {
        default_provider: config.default_provider.map(|k| k.name().to_string()),
        default_provider_source: config.sources.default_provider,
        timeout_seconds: config.ai_timeout.as_secs(),
        timeout_source: config.sources.ai_timeout,
        vault: secrets.uses_vault(),
        providers: manager.provider_status(),
        token_usage: manager.token_usage(),
    })
}
