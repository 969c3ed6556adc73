//! Configuration inheritance resolution
//!
//! This crate turns a graph of configuration fragments into one flattened
//! document:
//!
//! - **Documents**: JSON configuration files with reserved `config.name` /
//!   `config.inherits` / `config.from` keys
//! - **Closure walking**: one traversal over two edge kinds — unordered
//!   dependency sets and single-parent inheritance chains — with explicit
//!   cycle rejection
//! - **Merging**: ordered deep merge with per-leaf provenance tracking
//! - **Chain resolution**: load-an-ancestor-at-a-time resolution against an
//!   injected document source (conventional search paths live in the source,
//!   not in the algorithm)
//!
//! # Design Philosophy
//!
//! - Resolution is deterministic: the same inputs always produce the same
//!   order, the same merged document, and the same provenance
//! - Cycles fail loudly, naming a node on the cycle
//! - A resolution result is a transient value owned by one caller; nothing
//!   here holds shared mutable state

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

/// Configuration document parsing
pub mod document;
pub mod error;
/// Ordered deep merge with provenance
pub mod merge;
/// Chain resolution against a document source
pub mod resolver;
/// Generic closure walker over both edge kinds
pub mod walk;

pub use document::ConfigDocument;
pub use error::{ResolveError, Result};
pub use merge::{MergedDocument, Provenance, merge};
pub use resolver::{
    ChainResolver, DocumentSource, MemorySource, Resolution, SearchPathSource, resolve_at,
};
pub use walk::{Edges, walk, walk_dependencies, walk_inheritance};
