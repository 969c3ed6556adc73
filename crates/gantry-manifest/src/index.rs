//! Lookup structures over verified manifests.
//!
//! [`ManifestIndex`] serves one repository: uuid → record (uuids must be
//! unique, duplicates are a fatal structural error) and normalized display
//! name → records. [`MultiIndex`] layers cross-repository name lookup on
//! top, with the package-manager collision policy: an unqualified name is a
//! convenience, not an identity, so a collision across namespaces reports
//! every candidate instead of picking one.

use std::collections::BTreeMap;
use std::collections::HashMap;

use smol_str::SmolStr;

use crate::error::ManifestError;
use crate::manifest::Manifest;
use crate::record::{ArtifactKind, ArtifactRecord, normalize_name};

/// Filters applied to a name lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameQuery<'a> {
    /// Match only records targeting this slicer
    pub slicer: Option<&'a str>,
    /// Match only records of this kind
    pub kind: Option<&'a ArtifactKind>,
}

impl<'a> NameQuery<'a> {
    fn accepts(&self, record: &ArtifactRecord) -> bool {
        if let Some(slicer) = self.slicer
            && record.slicer != slicer
        {
            return false;
        }
        if let Some(kind) = self.kind
            && &record.kind != kind
        {
            return false;
        }
        true
    }
}

/// Read-only lookup structure over one verified manifest.
///
/// Built once per refresh, then shared freely: the index owns its manifest
/// and is never mutated, so concurrent resolution requests can read it
/// without synchronization.
#[derive(Debug, Clone)]
pub struct ManifestIndex {
    manifest: Manifest,
    by_uuid: HashMap<SmolStr, usize>,
    by_name: BTreeMap<String, Vec<usize>>,
}

impl ManifestIndex {
    /// Build the index, enforcing uuid uniqueness.
    pub fn build(manifest: Manifest) -> Result<Self, ManifestError> {
        let mut by_uuid = HashMap::with_capacity(manifest.profiles.len());
        let mut by_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (pos, record) in manifest.profiles.iter().enumerate() {
            if by_uuid.insert(record.uuid.clone(), pos).is_some() {
                return Err(ManifestError::DuplicateArtifact {
                    uuid: record.uuid.to_string(),
                });
            }
            by_name.entry(record.normalized_name()).or_default().push(pos);
        }
        Ok(Self {
            manifest,
            by_uuid,
            by_name,
        })
    }

    /// The manifest this index was built from
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Look up a record by its stable identifier
    pub fn by_uuid(&self, uuid: &str) -> Option<&ArtifactRecord> {
        self.by_uuid
            .get(uuid)
            .map(|&pos| &self.manifest.profiles[pos])
    }

    /// All records matching a display name (normalized) and query filters
    pub fn by_name<'a>(&'a self, name: &str, query: &NameQuery<'_>) -> Vec<&'a ArtifactRecord> {
        let Some(positions) = self.by_name.get(&normalize_name(name)) else {
            return Vec::new();
        };
        positions
            .iter()
            .map(|&pos| &self.manifest.profiles[pos])
            .filter(|record| query.accepts(record))
            .collect()
    }

    /// Iterate over every record in manifest order
    pub fn records(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.manifest.profiles.iter()
    }
}

/// Outcome of a name lookup across repositories.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    /// Exactly one record matched
    Found {
        /// Namespace of the owning repository
        namespace: &'a str,
        /// The matched record
        record: &'a ArtifactRecord,
    },
    /// The unqualified name matched in more than one place.
    ///
    /// Carries every `(namespace, record)` candidate so the caller can
    /// re-query with an explicit `namespace/name` identifier.
    Ambiguous(Vec<(&'a str, &'a ArtifactRecord)>),
    /// No record matched
    NotFound,
}

/// Cross-repository name lookup over `(namespace, index)` pairs.
///
/// A borrow-only view: assemble it from whatever verified manifests are
/// currently loaded, query it, drop it.
#[derive(Debug, Default)]
pub struct MultiIndex<'a> {
    entries: Vec<(&'a str, &'a ManifestIndex)>,
}

impl<'a> MultiIndex<'a> {
    /// Create an empty multi-index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one repository's index under its namespace
    pub fn push(&mut self, namespace: &'a str, index: &'a ManifestIndex) {
        self.entries.push((namespace, index));
    }

    /// Look up `namespace/name` or an unqualified `name`.
    ///
    /// A qualified query targets exactly one namespace and returns `Found`
    /// or `NotFound`, never `Ambiguous`. An unqualified query spans every
    /// namespace; if more than one candidate matches, all of them are
    /// returned for disambiguation.
    pub fn lookup(&self, name: &str, query: &NameQuery<'_>) -> Lookup<'a> {
        if let Some((namespace, bare)) = name.split_once('/') {
            let namespace = namespace.trim();
            for &(ns, index) in &self.entries {
                if ns != namespace {
                    continue;
                }
                return match index.by_name(bare.trim(), query).into_iter().next() {
                    Some(record) => Lookup::Found {
                        namespace: ns,
                        record,
                    },
                    None => Lookup::NotFound,
                };
            }
            return Lookup::NotFound;
        }

        let mut candidates = Vec::new();
        for &(ns, index) in &self.entries {
            for record in index.by_name(name, query) {
                candidates.push((ns, record));
            }
        }
        match candidates.len() {
            0 => Lookup::NotFound,
            1 => {
                let (namespace, record) = candidates[0];
                Lookup::Found { namespace, record }
            }
            _ => Lookup::Ambiguous(candidates),
        }
    }
}
