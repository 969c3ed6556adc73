//! Slicer-profile repository client
//!
//! Ties the verification and resolution layers into the two orchestrated
//! flows:
//!
//! - **Install**: authenticate manifest → index → dependency closure →
//!   fetch + digest-check every member → persist all-or-nothing
//! - **Config resolution**: locate the target record → walk its inheritance
//!   chain → merge the chain flat with provenance
//!
//! # Design Philosophy
//!
//! - Fail closed: a refresh that does not verify leaves the previously
//!   verified manifest in place untouched
//! - No partial success: a single digest mismatch inside a closure discards
//!   every byte of that operation
//! - No retries: a timeout is a failure; resilience is the caller's layer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
/// Byte fetching over HTTP or fixtures
pub mod fetch;
/// Cross-repository manager
pub mod manager;
/// Single-repository client
pub mod repo;
/// All-or-nothing artifact persistence
pub mod store;

pub use error::{ClientError, Result};
pub use fetch::{FetchError, Fetcher, HttpFetcher, MemoryFetcher};
pub use manager::{Match, RepoManager};
pub use repo::{ClientOptions, RepoClient, Repository, VerifiedManifest};
pub use store::{ArtifactStore, StagedInstall};
