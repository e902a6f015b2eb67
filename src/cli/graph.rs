//! Graph command implementation.

use crate::cli::args::{GraphArgs, OutputFormat};
use crate::core::graph::{CallGraph, GraphBuilder};
use crate::error::Result;
use crate::render;
use crate::storage::ResolvedConfig;

/// Execute the graph command.
pub fn execute(args: &GraphArgs, format: OutputFormat, pretty: bool) -> Result<()> {
    let config = ResolvedConfig::resolve()?;
    let graph = build(args, &config);
    println!("{}", render::render_graph(&graph, format, pretty)?);
    Ok(())
}

/// Build the graph with config exclusions and an optional hotspot override.
#[must_use]
pub fn build(args: &GraphArgs, config: &ResolvedConfig) -> CallGraph {
    let mut graph_config = config.config.graph.clone();
    if let Some(max) = args.max_hotspots {
        graph_config.max_hotspots = max;
    }
    GraphBuilder::from_config(&graph_config).build_graph(&args.root)
}
