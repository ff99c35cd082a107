use std::path::PathBuf;

use clap::Args;

use tokenlens_core::Resolver;
use tokenlens_core::TokenLensError;
use tokenlens_core::types::Breakpoint;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Property name to resolve (e.g. `--dsa-button--color`)
    #[arg(allow_hyphen_values = true)]
    pub property: String,

    /// Extraction JSON files (property → declarations), merged in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Breakpoint tier: phone, tablet, laptop, desktop
    #[arg(short, long, default_value = "desktop")]
    pub breakpoint: Breakpoint,

    /// Also print the pixel size if the value is in rem
    #[arg(long)]
    pub px: bool,

    /// Path to tokenlens.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: ResolveArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let (graph, _report) = super::load_graph(&args.files)?;

    let resolver =
        Resolver::new(&graph, &config.resolver).map_err(TokenLensError::Resolve)?;
    let value = resolver
        .resolve(&args.property, args.breakpoint)
        .map_err(TokenLensError::Resolve)?;

    if args.px && value.ends_with("rem") {
        let px = resolver.px_size(&value).map_err(TokenLensError::Resolve)?;
        println!("{value} ({px}px)");
    } else {
        println!("{value}");
    }
    Ok(())
}
