//! CLI argument definitions using clap.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::analyzer::AnalysisType;
use crate::core::language::Language;
use crate::core::refactor::DEFAULT_TOP_N;
use crate::error::{CodieError, Result};

/// Code analysis: complexity, AI suggestions, and call-graph hotspots.
#[derive(Parser, Debug)]
#[command(name = "codie")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSON logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub const fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Suggest improvements for a source file
    Analyze(AnalyzeArgs),

    /// Score the cyclomatic complexity of a source file
    Complexity(ComplexityArgs),

    /// Build the function call graph of a source tree
    Graph(GraphArgs),

    /// Rank refactoring candidates in a source tree
    Refactor(RefactorArgs),

    /// Show configured AI providers, breaker state, and token usage
    Providers,
}

/// Arguments for the `analyze` command.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Source file, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Language (python, javascript, typescript, java, go, rust); inferred
    /// from the file extension when omitted
    #[arg(long, short, value_name = "LANG")]
    pub language: Option<String>,

    /// Keep suggestions that do not mention a high-impact concern
    #[arg(long)]
    pub show_all: bool,

    /// Focus: general, security, performance, maintainability
    #[arg(long, value_name = "TYPE", default_value = "general")]
    pub analysis_type: String,
}

impl AnalyzeArgs {
    #[must_use]
    pub fn analysis_type(&self) -> AnalysisType {
        AnalysisType::from_name(&self.analysis_type)
    }
}

/// Arguments for the `complexity` command.
#[derive(Parser, Debug)]
pub struct ComplexityArgs {
    /// Source file, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Language; inferred from the file extension when omitted
    #[arg(long, short, value_name = "LANG")]
    pub language: Option<String>,
}

/// Arguments for the `graph` command.
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Repository root
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Number of hotspots to report (overrides config)
    #[arg(long, value_name = "N")]
    pub max_hotspots: Option<usize>,
}

/// Arguments for the `refactor` command.
#[derive(Parser, Debug)]
pub struct RefactorArgs {
    /// Repository root
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Number of suggestions to return
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Human,
    /// JSON wrapped in the `codie.v1` envelope
    Json,
}

/// Explicit `--language` wins; otherwise the file extension decides.
///
/// # Errors
///
/// Returns `InvalidArgument` when no language is given and none can be
/// inferred (including stdin input).
pub fn resolve_language(explicit: Option<&str>, input: &Path) -> Result<String> {
    if let Some(language) = explicit {
        return Ok(language.to_string());
    }
    input
        .extension()
        .and_then(|e| e.to_str())
        .and_then(Language::from_extension)
        .map(|l| l.name().to_string())
        .ok_or_else(|| CodieError::InvalidArgument {
            name: "language".to_string(),
            message: format!(
                "cannot infer language for '{}'; pass --language",
                input.display()
            ),
        })
}

/// Read a source file, or stdin for `-`.
///
/// # Errors
///
/// Returns an I/O error if the input cannot be read.
pub fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        Ok(std::io::read_to_string(std::io::stdin())?)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}
