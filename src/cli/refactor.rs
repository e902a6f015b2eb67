//! Refactor command implementation.

use crate::cli::args::{OutputFormat, RefactorArgs};
use crate::core::graph::GraphBuilder;
use crate::core::refactor::plan_from_graph;
use crate::error::Result;
use crate::render;
use crate::storage::ResolvedConfig;

/// Execute the refactor command.
pub fn execute(args: &RefactorArgs, format: OutputFormat, pretty: bool) -> Result<()> {
    let config = ResolvedConfig::resolve()?;
    let graph = GraphBuilder::from_config(&config.config.graph).build_graph(&args.root);
    let plan = plan_from_graph(&graph, args.top_n);
    println!("{}", render::render_refactor(&plan, format, pretty)?);
    Ok(())
}
