//! Error types for client operations

use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use gantry_manifest::{ArtifactRecord, ManifestError};
use gantry_resolve::ResolveError;

use crate::fetch::FetchError;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by repository refresh, install, and config resolution.
///
/// There is no partial-success value anywhere in this crate: every variant
/// means the whole operation it aborted produced nothing.
#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum ClientError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error("ambiguous name '{name}': found in {} namespaces", .candidates.len())]
    #[diagnostic(
        code(gantry_client::ambiguous_name),
        help("qualify the name as namespace/name to pick one candidate")
    )]
    AmbiguousName {
        name: String,
        candidates: Vec<(SmolStr, ArtifactRecord)>,
    },

    #[error("no verified manifest for repository '{namespace}'; refresh first")]
    #[diagnostic(code(gantry_client::no_manifest))]
    NoManifest { namespace: String },

    #[error("artifact not found: {id}")]
    #[diagnostic(code(gantry_client::artifact_not_found))]
    ArtifactNotFound { id: String },

    #[error("manifest lists no checksum for {path}")]
    #[diagnostic(
        code(gantry_client::missing_checksum),
        help("every closure member must carry a published digest; an unchecked download is never persisted")
    )]
    MissingChecksum { path: String },

    #[error("artifact path escapes the cache root: {path}")]
    #[diagnostic(
        code(gantry_client::unsafe_path),
        help("manifest storage paths must be relative and free of parent-directory components")
    )]
    UnsafePath { path: String },

    #[error("invalid repository url")]
    #[diagnostic(code(gantry_client::url))]
    Url(#[from] url::ParseError),

    #[error("filesystem operation failed")]
    #[diagnostic(code(gantry_client::io))]
    Io(#[from] std::io::Error),
}
