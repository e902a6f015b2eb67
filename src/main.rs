//! codie CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;

use clap::Parser;

use codie::cli::{Cli, Commands};
use codie::core::logging::{self, LogFormat, LogLevel, LogSettings};
use codie::render;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = LogSettings {
        level: cli
            .log_level
            .as_deref()
            .and_then(LogLevel::from_arg)
            .unwrap_or_default(),
        format: if cli.json_output {
            LogFormat::Json
        } else {
            LogFormat::default()
        },
        file: None,
    }
    .with_env(|key| std::env::var(key).ok());
    logging::init(settings, cli.verbose);

    let format = cli.effective_format();
    let pretty = cli.pretty;
    let command = command_name(&cli.command);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(code = e.error_code(), error = %e, "Command failed");
            eprintln!("{}", render::render_error(&e, command, format, pretty));
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> codie::Result<()> {
    let format = cli.effective_format();
    let pretty = cli.pretty;

    match cli.command {
        Commands::Analyze(args) => codie::cli::analyze::execute(&args, format, pretty).await,
        Commands::Complexity(args) => codie::cli::complexity::execute(&args, format, pretty),
        Commands::Graph(args) => codie::cli::graph::execute(&args, format, pretty),
        Commands::Refactor(args) => codie::cli::refactor::execute(&args, format, pretty),
        Commands::Providers => codie::cli::providers::execute(format, pretty).await,
    }
}

const fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Analyze(_) => "analyze",
        Commands::Complexity(_) => "complexity",
        Commands::Graph(_) => "graph",
        Commands::Refactor(_) => "refactor",
        Commands::Providers => "providers",
    }
}
