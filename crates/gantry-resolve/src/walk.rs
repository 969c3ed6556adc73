//! Generic closure walker.
//!
//! Profile downloads and configuration inheritance are the same problem —
//! compute the closure of named nodes reachable from a root — differing only
//! in edge kind. A dependency edge set is unordered and all-required; an
//! inheritance edge is a single parent pointer forming an ordered chain. One
//! walker serves both, tagged by what the edge function returns per node.

use std::collections::{BTreeSet, VecDeque};

use smol_str::SmolStr;

use crate::error::ResolveError;

/// The outgoing edges of one node, tagged by edge kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edges {
    /// Unordered set of required nodes (profile dependencies)
    Dependencies(Vec<SmolStr>),
    /// Single optional parent pointer (configuration inheritance)
    Parent(Option<SmolStr>),
}

/// Walk the closure reachable from `root`, in discovery order.
///
/// Breadth-first with a frontier queue and a seen set; a node is recorded
/// only after its own edges have been expanded, and every reachable node
/// appears exactly once (the root included). Revisiting a node is benign
/// for dependency edges (diamonds are expected) but fatal for parent edges:
/// a parent chain is linear, so a repeat can only mean a cycle, and the
/// walk fails with [`ResolveError::Circular`] naming the node that closes
/// it.
pub fn walk(
    root: &str,
    mut edges: impl FnMut(&str) -> Result<Edges, ResolveError>,
) -> Result<Vec<SmolStr>, ResolveError> {
    let mut order = Vec::new();
    let mut seen = BTreeSet::new();
    let mut frontier = VecDeque::new();

    let root = SmolStr::new(root);
    seen.insert(root.clone());
    frontier.push_back(root);

    while let Some(id) = frontier.pop_front() {
        match edges(&id)? {
            Edges::Dependencies(deps) => {
                for dep in deps {
                    if seen.insert(dep.clone()) {
                        frontier.push_back(dep);
                    }
                }
            }
            Edges::Parent(parent) => {
                if let Some(parent) = parent {
                    if !seen.insert(parent.clone()) {
                        return Err(ResolveError::Circular {
                            id: parent.to_string(),
                        });
                    }
                    frontier.push_back(parent);
                }
            }
        }
        order.push(id);
    }
    Ok(order)
}

/// Dependency-set closure: every artifact transitively required by `root`.
///
/// `deps_of` maps an identifier to its declared dependency list; an unknown
/// identifier should be reported by `deps_of` as [`ResolveError::NotFound`].
/// Order is discovery order and not semantically significant — downloads
/// are independent of one another.
pub fn walk_dependencies(
    root: &str,
    mut deps_of: impl FnMut(&str) -> Result<Vec<SmolStr>, ResolveError>,
) -> Result<Vec<SmolStr>, ResolveError> {
    walk(root, |id| Ok(Edges::Dependencies(deps_of(id)?)))
}

/// Inheritance chain: the ordered ancestors of `start`.
///
/// Returns most distant ancestor first, immediate parent last — exactly the
/// merge order for resolution, with `start` itself excluded (the caller
/// merges it last). Self-inheritance and longer cycles fail with
/// [`ResolveError::Circular`].
pub fn walk_inheritance(
    start: &str,
    mut parent_of: impl FnMut(&str) -> Result<Option<SmolStr>, ResolveError>,
) -> Result<Vec<SmolStr>, ResolveError> {
    let mut chain = walk(start, |id| Ok(Edges::Parent(parent_of(id)?)))?;
    chain.remove(0);
    chain.reverse();
    Ok(chain)
}
