//! Analyze command implementation.

use std::sync::Arc;

use crate::cli::args::{AnalyzeArgs, OutputFormat, read_input, resolve_language};
use crate::core::analyzer::AiAnalyzer;
use crate::core::complexity::complexity_of;
use crate::core::language::Language;
use crate::core::manager::ProviderManager;
use crate::core::models::AnalysisPayload;
use crate::error::Result;
use crate::render;
use crate::storage::{ResolvedConfig, SecretResolver};

/// Execute the analyze command.
pub async fn execute(args: &AnalyzeArgs, format: OutputFormat, pretty: bool) -> Result<()> {
    let config = ResolvedConfig::resolve()?;
    let secrets = SecretResolver::from_env();
    let payload = analyze(args, &config, &secrets).await?;
    println!("{}", render::render_analysis(&payload, format, pretty)?);
    Ok(())
}

/// Read the input and run one analysis against the configured providers.
///
/// # Errors
///
/// Returns an error for unreadable input, empty code, an unsupported
/// language, or invalid provider configuration.
pub async fn analyze(
    args: &AnalyzeArgs,
    config: &ResolvedConfig,
    secrets: &SecretResolver,
) -> Result<AnalysisPayload> {
    let language = Language::parse(&resolve_language(args.language.as_deref(), &args.input)?)?;
    let code = read_input(&args.input)?;
    let analysis_type = args.analysis_type();

    let manager = Arc::new(ProviderManager::from_config(config, secrets).await?);
    tracing::debug!(providers = ?manager.provider_names(), "Provider manager ready");
    let analyzer = AiAnalyzer::from_config(manager, config);

    let suggestions = analyzer
        .analyze_code(&code, language.name(), args.show_all, analysis_type)
        .await?;

    Ok(AnalysisPayload {
        source: args.input.display().to_string(),
        language: language.name().to_string(),
        analysis_type,
        show_all: args.show_all,
        complexity: complexity_of(language, &code),
        suggestions,
    })
}
