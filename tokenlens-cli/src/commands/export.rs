use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use tokenlens_core::component::design_system_subgraph;
use tokenlens_core::serialize::to_renderer;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Extraction JSON files (property → declarations), merged in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Export the design-system subgraph instead of the full graph
    #[arg(long)]
    pub design_system: bool,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Path to tokenlens.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let (mut graph, _report) = super::load_graph(&args.files)?;

    if args.design_system {
        graph = design_system_subgraph(&graph);
    }
    graph.annotate_parallel_edges(config.layout.base_curvature);

    let serialized = to_renderer(&graph);
    let json = if args.pretty {
        serde_json::to_string_pretty(&serialized)?
    } else {
        serde_json::to_string(&serialized)?
    };

    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Cannot write output: {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
