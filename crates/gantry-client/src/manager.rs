//! Cross-repository manager.
//!
//! Owns one [`RepoClient`] per namespace and layers name-based lookup on
//! top: unqualified names span every repository and surface collisions as
//! explicit ambiguity, `namespace/name` targets exactly one.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use smol_str::SmolStr;

use gantry_manifest::{ArtifactKind, ArtifactRecord, Lookup, MultiIndex, NameQuery};
use gantry_resolve::Resolution;

use crate::error::ClientError;
use crate::fetch::Fetcher;
use crate::repo::{ClientOptions, RepoClient, Repository, VerifiedManifest};

/// Owned outcome of a cross-repository name lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    /// Exactly one record matched
    Found {
        /// Namespace of the owning repository
        namespace: SmolStr,
        /// The matched record
        record: ArtifactRecord,
    },
    /// Multiple namespaces matched; qualify the name to disambiguate
    Ambiguous(Vec<(SmolStr, ArtifactRecord)>),
    /// No record matched
    NotFound,
}

/// A set of repositories addressed by namespace.
#[derive(Debug)]
pub struct RepoManager<F> {
    clients: BTreeMap<SmolStr, RepoClient<F>>,
}

impl<F> Default for RepoManager<F> {
    fn default() -> Self {
        Self {
            clients: BTreeMap::new(),
        }
    }
}

impl<F: Fetcher + Sync> RepoManager<F> {
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            clients: BTreeMap::new(),
        }
    }

    /// Add a repository (replacing any previous client for its namespace)
    pub fn add(&mut self, repo: Repository, fetcher: F, options: ClientOptions) {
        let namespace = repo.namespace.clone();
        self.clients
            .insert(namespace, RepoClient::new(repo, fetcher, options));
    }

    /// The client for one namespace
    pub fn client(&self, namespace: &str) -> Option<&RepoClient<F>> {
        self.clients.get(namespace)
    }

    /// Namespaces currently managed, in order
    pub fn namespaces(&self) -> impl Iterator<Item = &SmolStr> {
        self.clients.keys()
    }

    /// Refresh every repository, collecting per-namespace failures.
    ///
    /// Each repository fails closed independently: one bad signature does
    /// not stop the others from refreshing, and it does not clear that
    /// repository's previously verified manifest either.
    pub async fn update_all(&self) -> Vec<(SmolStr, ClientError)> {
        let mut failures = Vec::new();
        for (namespace, client) in &self.clients {
            if let Err(e) = client.refresh().await {
                tracing::warn!(namespace = %namespace, error = %e, "repository refresh failed");
                failures.push((namespace.clone(), e));
            }
        }
        failures
    }

    /// Every record across all repositories, optionally filtered by slicer
    pub async fn list_profiles(&self, slicer: Option<&str>) -> Vec<(SmolStr, ArtifactRecord)> {
        let mut profiles = Vec::new();
        for (namespace, client) in &self.clients {
            for record in client.list(slicer).await {
                profiles.push((namespace.clone(), record));
            }
        }
        profiles
    }

    /// Snapshot of every verified manifest, by namespace
    async fn snapshots(&self) -> Vec<(SmolStr, Arc<VerifiedManifest>)> {
        let mut snapshots = Vec::new();
        for (namespace, client) in &self.clients {
            if let Some(verified) = client.current().await {
                snapshots.push((namespace.clone(), verified));
            }
        }
        snapshots
    }

    /// Find a record by unqualified or `namespace/name` qualified name.
    pub async fn find(
        &self,
        name: &str,
        slicer: Option<&str>,
        kind: Option<&ArtifactKind>,
    ) -> Match {
        let snapshots = self.snapshots().await;
        let mut multi = MultiIndex::new();
        for (namespace, verified) in &snapshots {
            multi.push(namespace.as_str(), verified.index());
        }
        let query = NameQuery { slicer, kind };
        match multi.lookup(name, &query) {
            Lookup::Found { namespace, record } => Match::Found {
                namespace: SmolStr::new(namespace),
                record: record.clone(),
            },
            Lookup::Ambiguous(candidates) => Match::Ambiguous(
                candidates
                    .into_iter()
                    .map(|(ns, record)| (SmolStr::new(ns), record.clone()))
                    .collect(),
            ),
            Lookup::NotFound => Match::NotFound,
        }
    }

    /// Install a profile (and closure) found by name.
    pub async fn install(
        &self,
        name: &str,
        slicer: Option<&str>,
        kind: Option<&ArtifactKind>,
    ) -> Result<Vec<PathBuf>, ClientError> {
        let (namespace, record) = self.require_one(name, slicer, kind).await?;
        let client = self
            .clients
            .get(&namespace)
            .ok_or_else(|| ClientError::NoManifest {
                namespace: namespace.to_string(),
            })?;
        client.install(&record.uuid).await
    }

    /// Resolve the inheritance chain of a profile found by name.
    pub async fn resolve_config(
        &self,
        name: &str,
        slicer: Option<&str>,
        kind: Option<&ArtifactKind>,
    ) -> Result<Resolution, ClientError> {
        let (namespace, record) = self.require_one(name, slicer, kind).await?;
        let client = self
            .clients
            .get(&namespace)
            .ok_or_else(|| ClientError::NoManifest {
                namespace: namespace.to_string(),
            })?;
        client.resolve_config(&record.uuid).await
    }

    async fn require_one(
        &self,
        name: &str,
        slicer: Option<&str>,
        kind: Option<&ArtifactKind>,
    ) -> Result<(SmolStr, ArtifactRecord), ClientError> {
        match self.find(name, slicer, kind).await {
            Match::Found { namespace, record } => Ok((namespace, record)),
            Match::Ambiguous(candidates) => Err(ClientError::AmbiguousName {
                name: name.to_string(),
                candidates,
            }),
            Match::NotFound => Err(ClientError::ArtifactNotFound {
                id: name.to_string(),
            }),
        }
    }
}
