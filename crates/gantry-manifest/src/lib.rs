//! Signed manifest primitives for slicer-profile repositories
//!
//! This crate provides the trust-bearing half of a profile repository client:
//!
//! - **Digests**: tagged content digests (`sha256:<hex>`) with hard-fail
//!   verification — an unrecognized algorithm is an error, never a skip
//! - **Signature gate**: detached ed25519 signatures verified over the raw
//!   manifest bytes against a trusted keyring
//! - **Wire format**: the `manifest.json` structure (artifact records plus a
//!   path → digest checksum table)
//! - **Index**: uuid and name lookups over one verified manifest, and
//!   cross-repository lookups with explicit ambiguity reporting
//!
//! # Design Philosophy
//!
//! - A manifest is immutable once parsed; a refresh replaces it wholesale
//! - Verification failures are loud and carry the offending identifier/path
//! - Nothing here touches the network or the filesystem

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

/// Content digest parsing and verification
pub mod digest;
pub mod error;
/// Lookup structures over verified manifests
pub mod index;
/// Manifest wire format
pub mod manifest;
/// Artifact records
pub mod record;
/// Detached signature verification against a trusted keyring
pub mod signature;

pub use digest::{Digest, DigestAlgorithm};
pub use error::{ManifestError, Result};
pub use index::{Lookup, ManifestIndex, MultiIndex, NameQuery};
pub use manifest::Manifest;
pub use record::{ArtifactKind, ArtifactRecord};
pub use signature::{Keyring, authenticate};
