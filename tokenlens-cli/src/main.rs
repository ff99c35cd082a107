use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "tokenlens",
    version,
    about = "Explore a design system's CSS custom-property reference graph"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0 — success
///   1 — general/unknown error
///   2 — configuration error
///   3 — input error (token files unreadable or malformed)
///   4 — unknown property/node/graph
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    use tokenlens_core::error::{QueryError, ResolveError, TokenLensError};

    match err.downcast_ref::<TokenLensError>() {
        Some(TokenLensError::Config(_)) => 2,
        Some(TokenLensError::Build(_)) => 3,
        Some(TokenLensError::Resolve(ResolveError::PropertyNotFound(_))) => 4,
        Some(TokenLensError::Query(
            QueryError::UnknownNode(_) | QueryError::UnknownGraph(_),
        )) => 4,
        Some(_) => 1,
        None => {
            if err.downcast_ref::<std::io::Error>().is_some()
                || err.downcast_ref::<serde_json::Error>().is_some()
            {
                3
            } else {
                1
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match commands::run(cli.command) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenlens_core::error::{QueryError, ResolveError, TokenLensError};

    #[test]
    fn exit_code_config() {
        let err = anyhow::Error::new(TokenLensError::Config(
            tokenlens_core::error::ConfigError::Invalid("bad".into()),
        ));
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_unknown_property() {
        let err = anyhow::Error::new(TokenLensError::Resolve(ResolveError::PropertyNotFound(
            "--x".into(),
        )));
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_unknown_node() {
        let err = anyhow::Error::new(TokenLensError::Query(QueryError::UnknownNode("--x".into())));
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_io_is_input_error() {
        let err = anyhow::Error::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing tokens.json",
        ));
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::anyhow!("Something unexpected happened");
        assert_eq!(classify_exit_code(&err), 1);
    }
}
