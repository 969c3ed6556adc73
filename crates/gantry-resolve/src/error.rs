//! Error types for configuration resolution

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors produced while walking and merging configuration graphs.
///
/// `Circular` and `NotFound` abort the single resolution request being
/// processed; they are never retried automatically.
#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum ResolveError {
    #[error("circular dependency: {id} closes an inheritance cycle")]
    #[diagnostic(
        code(gantry_resolve::circular),
        help("a configuration may not inherit from itself or from any of its descendants")
    )]
    Circular { id: String },

    #[error("configuration not found: {name}")]
    #[diagnostic(
        code(gantry_resolve::not_found),
        help("the identifier is absent from the index and from the configured search locations")
    )]
    NotFound { name: String },

    #[error("configuration document has no config.name")]
    #[diagnostic(
        code(gantry_resolve::missing_name),
        help("every configuration document must carry a config object with a name field")
    )]
    MissingName,

    #[error("malformed configuration document: {reason}")]
    #[diagnostic(code(gantry_resolve::malformed))]
    Malformed { reason: String },

    #[error("failed to read configuration at {path}")]
    #[diagnostic(code(gantry_resolve::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
