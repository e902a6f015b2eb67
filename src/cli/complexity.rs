//! Complexity command implementation.

use crate::cli::args::{ComplexityArgs, OutputFormat, read_input, resolve_language};
use crate::core::complexity::complexity_of;
use crate::core::language::Language;
use crate::core::models::ComplexityPayload;
use crate::core::parser::parse_snippet;
use crate::error::{CodieError, Result};
use crate::render;

/// Execute the complexity command.
pub fn execute(args: &ComplexityArgs, format: OutputFormat, pretty: bool) -> Result<()> {
    let payload = score(args)?;
    println!("{}", render::render_complexity(&payload, format, pretty)?);
    Ok(())
}

/// Score the input file.
///
/// # Errors
///
/// Returns an error for unreadable input, empty code, or an unsupported
/// language.
pub fn score(args: &ComplexityArgs) -> Result<ComplexityPayload> {
    let language = Language::parse(&resolve_language(args.language.as_deref(), &args.input)?)?;
    let code = read_input(&args.input)?;
    if code.trim().is_empty() {
        return Err(CodieError::EmptyCode);
    }

    Ok(ComplexityPayload {
        source: args.input.display().to_string(),
        language: language.name().to_string(),
        complexity: complexity_of(language, &code),
        structure: parse_snippet(language.name(), &code),
    })
}
