pub mod communities;
pub mod components;
pub mod export;
pub mod query;
pub mod resolve;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use tracing::warn;

use tokenlens_core::TokenGraph;
use tokenlens_core::config::TokenLensConfig;
use tokenlens_core::engine::FULL_GRAPH;
use tokenlens_core::graph::BuildReport;
use tokenlens_core::merge::merge_sources;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the reference graph and write the serialized renderer graph
    Export(export::ExportArgs),
    /// Resolve a property's effective value at a breakpoint
    Resolve(resolve::ResolveArgs),
    /// List ancestors/descendants reachable from a property
    Query(query::QueryArgs),
    /// Detect communities and list the menu-sized ones
    Communities(communities::CommunitiesArgs),
    /// List UI component groups and their member tokens
    Components(components::ComponentsArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Export(args) => export::run(args),
        Command::Resolve(args) => resolve::run(args),
        Command::Query(args) => query::run(args),
        Command::Communities(args) => communities::run(args),
        Command::Components(args) => components::run(args),
    }
}

/// Load the optional config file; defaults apply when the flag is absent.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<TokenLensConfig> {
    match path {
        Some(path) => Ok(TokenLensConfig::load(path)
            .map_err(tokenlens_core::TokenLensError::Config)?),
        None => Ok(TokenLensConfig::default()),
    }
}

/// Read extraction JSON files, merge them in order, and build the full
/// graph. Malformed references warn but do not abort.
pub fn load_graph(files: &[PathBuf]) -> anyhow::Result<(TokenGraph, BuildReport)> {
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Cannot read token file: {}", file.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Cannot parse token file: {}", file.display()))?;
        sources.push(value);
    }

    let declarations = merge_sources(sources)
        .map_err(tokenlens_core::TokenLensError::Build)?;
    let (graph, report) = TokenGraph::build(FULL_GRAPH, &declarations);
    if !report.malformed.is_empty() {
        warn!(
            count = report.malformed.len(),
            "Some declarations carried malformed var() references"
        );
    }
    Ok((graph, report))
}
