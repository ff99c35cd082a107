use std::path::PathBuf;

use clap::Args;

use tokenlens_core::component::{component_display_name, component_groups};

#[derive(Args, Debug)]
pub struct ComponentsArgs {
    /// Extraction JSON files (property → declarations), merged in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// List member tokens under each component
    #[arg(long)]
    pub members: bool,
}

pub fn run(args: ComponentsArgs) -> anyhow::Result<()> {
    let (graph, _report) = super::load_graph(&args.files)?;

    for (selector, members) in component_groups(&graph) {
        println!(
            "{selector}  ({} tokens)  {}",
            members.len(),
            component_display_name(&selector)
        );
        if args.members {
            for member in members {
                println!("    {member}");
            }
        }
    }
    Ok(())
}
