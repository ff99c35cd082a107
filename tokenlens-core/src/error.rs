/// Top-level tokenlens error type.
///
/// All fallible operations in `tokenlens-core` return
/// [`Result<T, TokenLensError>`](Result). Each variant wraps a
/// phase-specific error enum, allowing callers to match on the error
/// source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum TokenLensError {
    /// Error while building the reference graph from declarations.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Error while resolving a property value.
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Error from the query engine (selection, traversal, contours).
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors during graph construction.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    /// A `var()` call with no parseable variable name.
    #[error("Malformed var() reference in `{property}` value `{value}`")]
    MalformedReference {
        /// Property whose declaration contains the bad reference.
        property: String,
        /// The offending declaration value.
        value: String,
    },

    /// Source data could not be deserialized into declarations.
    #[error("Declaration parse error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Errors while resolving a property to its effective value.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// The property has no declarations (or does not exist at all).
    #[error("Property {0} not found")]
    PropertyNotFound(String),

    /// A `var()` chain references itself, directly or transitively.
    #[error("Cyclic reference resolving {property}: {chain}")]
    CyclicReference {
        /// Property whose resolution revisited a name.
        property: String,
        /// The chain of names walked before the revisit, `->`-joined.
        chain: String,
    },

    /// A `calc()` expression could not be evaluated.
    #[error("calc error in `{expression}`: {message}")]
    Calc {
        /// The expression under evaluation (after var substitution).
        expression: String,
        /// Description of the failure.
        message: String,
    },

    /// The breakpoints token is missing or its value is unusable.
    #[error("Breakpoints token unusable: {0}")]
    Breakpoints(String),
}

/// Errors from query-engine operations.
///
/// These are caller contract violations — fail fast, no silent no-ops.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    /// A query operation was invoked before any graph was initialized.
    #[error("No graph context: {0}")]
    MissingGraphContext(String),

    /// `select_subgraph` was asked for a graph name that does not exist.
    #[error("Unknown graph: {0}")]
    UnknownGraph(String),

    /// A traversal or focus referenced a node key not in the active graph.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A contour toggle referenced a community id that was never detected.
    #[error("Unknown community: {0}")]
    UnknownCommunity(u32),

    /// A contour toggle referenced a component with no member nodes.
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
}

/// Errors in tokenlens configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for `Result<T, TokenLensError>`.
pub type Result<T> = std::result::Result<T, TokenLensError>;
