use std::path::PathBuf;

use clap::Args;

use tokenlens_core::QueryEngine;
use tokenlens_core::TokenLensError;
use tokenlens_core::engine::DESIGN_SYSTEM_GRAPH;
use tokenlens_core::types::AncestryDirection;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Property name to start the traversal from
    #[arg(allow_hyphen_values = true)]
    pub property: String,

    /// Extraction JSON files (property → declarations), merged in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Traversal direction: both, ascendants, descendants
    #[arg(short, long, default_value = "both")]
    pub direction: AncestryDirection,

    /// Extra expansion hops beyond direct reachability
    #[arg(long, default_value_t = 0)]
    pub depth: u32,

    /// Query the design-system subgraph instead of the full graph
    #[arg(long)]
    pub design_system: bool,

    /// Output as JSON instead of one key per line
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: QueryArgs) -> anyhow::Result<()> {
    let (graph, _report) = super::load_graph(&args.files)?;
    let mut engine = QueryEngine::new(graph);
    if args.design_system {
        engine
            .select_subgraph(DESIGN_SYSTEM_GRAPH)
            .map_err(TokenLensError::Query)?;
    }

    let nodes = engine
        .discover_nodes(&args.property, args.direction, args.depth)
        .map_err(TokenLensError::Query)?;

    if args.json {
        println!("{}", serde_json::to_string(&nodes)?);
    } else {
        for node in &nodes {
            println!("{node}");
        }
    }
    Ok(())
}
