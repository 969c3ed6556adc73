//! Error types for manifest parsing and verification

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for manifest operations
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Errors produced while parsing, indexing, or verifying a manifest.
///
/// Verification errors are terminal for the refresh cycle that produced
/// them: a caller holding a previously verified manifest keeps it
/// (fail-closed), and a caller mid-download aborts the whole operation.
#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum ManifestError {
    #[error("malformed manifest: {reason}")]
    #[diagnostic(
        code(gantry_manifest::malformed),
        help("the manifest must be a JSON object with spec_version, namespace, profiles, checksums")
    )]
    Malformed { reason: String },

    #[error("duplicate artifact uuid in manifest: {uuid}")]
    #[diagnostic(
        code(gantry_manifest::duplicate_artifact),
        help("every artifact uuid must be unique within one manifest")
    )]
    DuplicateArtifact { uuid: String },

    #[error("manifest signature invalid: {reason}")]
    #[diagnostic(
        code(gantry_manifest::signature_invalid),
        help("the repository is untrusted until a signature validates; do not fall back to the unverified manifest")
    )]
    SignatureInvalid { reason: String },

    #[error("malformed digest value: {value}")]
    #[diagnostic(
        code(gantry_manifest::malformed_digest),
        help("expected the form <algorithm>:<hexdigest>, e.g. sha256:ab12...")
    )]
    MalformedDigest { value: String },

    #[error("unsupported digest algorithm: {algorithm}")]
    #[diagnostic(
        code(gantry_manifest::unsupported_digest),
        help("an unknown algorithm fails verification outright; it is never treated as verified")
    )]
    UnsupportedDigestAlgorithm { algorithm: String },

    #[error("digest mismatch for {path}: expected {expected}, got {actual}")]
    #[diagnostic(
        code(gantry_manifest::digest_mismatch),
        help("the downloaded bytes do not match the published checksum; the content may be corrupt or tampered with")
    )]
    DigestMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}
