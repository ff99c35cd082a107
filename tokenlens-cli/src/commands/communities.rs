use std::path::PathBuf;

use clap::Args;

use tokenlens_core::QueryEngine;
use tokenlens_core::TokenLensError;
use tokenlens_core::engine::DESIGN_SYSTEM_GRAPH;

#[derive(Args, Debug)]
pub struct CommunitiesArgs {
    /// Extraction JSON files (property → declarations), merged in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Detect over the design-system subgraph instead of the full graph
    #[arg(long)]
    pub design_system: bool,

    /// Include communities below the menu size cutoff
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: CommunitiesArgs) -> anyhow::Result<()> {
    let (graph, _report) = super::load_graph(&args.files)?;
    let mut engine = QueryEngine::new(graph);
    if args.design_system {
        engine
            .select_subgraph(DESIGN_SYSTEM_GRAPH)
            .map_err(TokenLensError::Query)?;
    }
    engine.detect_communities().map_err(TokenLensError::Query)?;

    if args.all {
        for info in engine.communities().values() {
            println!("{:>4}  {:>5}  {}", info.id, info.count, info.name);
        }
    } else {
        for (info, _color) in engine.menu_communities() {
            println!("{:>4}  {:>5}  {}", info.id, info.count, info.name);
        }
    }
    Ok(())
}
