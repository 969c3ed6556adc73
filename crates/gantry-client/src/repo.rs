//! Single-repository client: verified refresh and all-or-nothing installs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use bytes::Bytes;
use futures::StreamExt;
use futures::TryStreamExt;
use futures::stream;
use smol_str::SmolStr;
use tokio::sync::RwLock;
use url::Url;

use gantry_manifest::{
    ArtifactRecord, Digest, Keyring, Manifest, ManifestIndex, authenticate,
    signature::KeyId,
};
use gantry_resolve::{ChainResolver, ConfigDocument, Resolution, ResolveError, SearchPathSource};
use gantry_resolve::walk_dependencies;

use crate::error::ClientError;
use crate::fetch::Fetcher;
use crate::store::ArtifactStore;

/// One trust boundary: a network origin, a namespace, and the keys allowed
/// to sign its manifest.
#[derive(Debug, Clone)]
pub struct Repository {
    /// Base url artifacts and the manifest are fetched relative to
    pub origin: Url,
    /// Namespace the repository publishes under
    pub namespace: SmolStr,
    /// Keys trusted to sign this repository's manifest
    pub keyring: Keyring,
}

impl Repository {
    /// Create a repository, normalizing the origin to end in `/` so
    /// relative storage paths join underneath it rather than beside it.
    pub fn new(mut origin: Url, namespace: impl Into<SmolStr>, keyring: Keyring) -> Self {
        if !origin.path().ends_with('/') {
            let path = format!("{}/", origin.path());
            origin.set_path(&path);
        }
        Self {
            origin,
            namespace: namespace.into(),
            keyring,
        }
    }
}

/// A manifest that passed the signature gate, plus its index.
///
/// Immutable and `Arc`-shared: concurrent resolution requests read it
/// without synchronization, and a refresh swaps in a whole new value rather
/// than mutating this one.
#[derive(Debug)]
pub struct VerifiedManifest {
    signer: KeyId,
    index: ManifestIndex,
}

impl VerifiedManifest {
    /// Key id that signed the manifest
    pub fn signer(&self) -> &str {
        &self.signer
    }

    /// Lookup structure over the manifest
    pub fn index(&self) -> &ManifestIndex {
        &self.index
    }

    /// The verified manifest itself
    pub fn manifest(&self) -> &Manifest {
        self.index.manifest()
    }
}

/// Client configuration.
#[derive(Debug, Clone, Builder)]
#[builder(start_fn = new)]
pub struct ClientOptions {
    /// Directory installed artifacts land in
    #[builder(into)]
    pub cache_dir: PathBuf,
    /// Bound on every single network fetch
    #[builder(default = Duration::from_secs(10))]
    pub fetch_timeout: Duration,
    /// Manifest file name at the repository origin
    #[builder(default = SmolStr::new_static("manifest.json"))]
    pub manifest_name: SmolStr,
    /// Detached signature file name, a sibling of the manifest
    #[builder(default = SmolStr::new_static("manifest.json.sig"))]
    pub signature_name: SmolStr,
    /// Concurrent downloads per closure install
    #[builder(default = 4)]
    pub max_concurrent_fetches: usize,
}

/// A download job for one closure member
struct FetchJob {
    uuid: SmolStr,
    path: String,
    url: Url,
    digest: Digest,
}

/// Client for one repository.
///
/// Methods take `&self`; the verified state lives behind a `RwLock` so a
/// refresh builds the new manifest fully before swapping the reference,
/// and in-flight readers keep the snapshot they started with.
#[derive(Debug)]
pub struct RepoClient<F> {
    repo: Repository,
    fetcher: F,
    options: ClientOptions,
    store: ArtifactStore,
    current: RwLock<Option<Arc<VerifiedManifest>>>,
}

impl<F: Fetcher + Sync> RepoClient<F> {
    /// Create a client; no network traffic until [`refresh`](Self::refresh)
    pub fn new(repo: Repository, fetcher: F, options: ClientOptions) -> Self {
        let store = ArtifactStore::new(options.cache_dir.clone());
        Self {
            repo,
            fetcher,
            options,
            store,
            current: RwLock::new(None),
        }
    }

    /// The repository this client talks to
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// The artifact cache
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The currently verified manifest, if any refresh has succeeded
    pub async fn current(&self) -> Option<Arc<VerifiedManifest>> {
        self.current.read().await.clone()
    }

    /// Fetch and verify the latest manifest.
    ///
    /// Pipeline: fetch manifest bytes and detached signature → authenticate
    /// over the raw bytes → parse → index. Any failure along the way leaves
    /// the previously verified manifest in place untouched (fail-closed).
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let manifest_url = self.repo.origin.join(&self.options.manifest_name)?;
        let signature_url = self.repo.origin.join(&self.options.signature_name)?;
        tracing::info!(namespace = %self.repo.namespace, url = %manifest_url, "fetching manifest");

        let manifest_bytes = self
            .fetcher
            .fetch(&manifest_url, self.options.fetch_timeout)
            .await?;
        let signature_bytes = self
            .fetcher
            .fetch(&signature_url, self.options.fetch_timeout)
            .await?;

        let signer = authenticate(&manifest_bytes, &signature_bytes, &self.repo.keyring)?;
        let manifest = Manifest::from_slice(&manifest_bytes)?;
        if manifest.namespace != self.repo.namespace {
            return Err(gantry_manifest::ManifestError::Malformed {
                reason: format!(
                    "manifest namespace '{}' does not match repository '{}'",
                    manifest.namespace, self.repo.namespace
                ),
            }
            .into());
        }
        let index = ManifestIndex::build(manifest)?;

        let verified = Arc::new(VerifiedManifest { signer, index });
        tracing::info!(
            namespace = %self.repo.namespace,
            signer = verified.signer(),
            profiles = verified.manifest().profiles.len(),
            "manifest verified"
        );
        *self.current.write().await = Some(verified);
        Ok(())
    }

    /// Records published by this repository, optionally filtered by slicer
    pub async fn list(&self, slicer: Option<&str>) -> Vec<ArtifactRecord> {
        let Some(verified) = self.current().await else {
            return Vec::new();
        };
        verified
            .index()
            .records()
            .filter(|r| slicer.is_none_or(|s| r.slicer == s))
            .cloned()
            .collect()
    }

    /// Install an artifact and its full dependency closure.
    ///
    /// Computes the closure, downloads members concurrently (bounded), and
    /// digest-checks every payload against the manifest's checksum table.
    /// The first failure — fetch, missing checksum, digest mismatch —
    /// aborts the whole operation and discards everything staged so far;
    /// files only become visible once all of them verified.
    pub async fn install(&self, uuid: &str) -> Result<Vec<PathBuf>, ClientError> {
        let verified =
            self.current()
                .await
                .ok_or_else(|| ClientError::NoManifest {
                    namespace: self.repo.namespace.to_string(),
                })?;
        let index = verified.index();
        if index.by_uuid(uuid).is_none() {
            return Err(ClientError::ArtifactNotFound {
                id: uuid.to_string(),
            });
        }

        let closure = walk_dependencies(uuid, |id| {
            index
                .by_uuid(id)
                .map(|record| record.dependencies.clone())
                .ok_or_else(|| ResolveError::NotFound {
                    name: id.to_string(),
                })
        })?;
        tracing::debug!(uuid, members = closure.len(), "computed dependency closure");

        let mut jobs = Vec::with_capacity(closure.len());
        for id in &closure {
            let record = index
                .by_uuid(id)
                .ok_or_else(|| ClientError::ArtifactNotFound { id: id.to_string() })?;
            let checksum = verified.manifest().checksum_for(&record.path).ok_or_else(|| {
                ClientError::MissingChecksum {
                    path: record.path.clone(),
                }
            })?;
            jobs.push(FetchJob {
                uuid: id.clone(),
                path: record.path.clone(),
                url: self.repo.origin.join(&record.path)?,
                digest: Digest::parse(checksum)?,
            });
        }

        let timeout = self.options.fetch_timeout;
        let fetched: Vec<(String, Bytes)> = stream::iter(jobs.into_iter().map(|job| {
            let fetcher = self.fetcher.clone();
            async move {
                tracing::debug!(uuid = %job.uuid, url = %job.url, "downloading artifact");
                let bytes = fetcher.fetch(&job.url, timeout).await?;
                job.digest.verify(&bytes, &job.path)?;
                Ok::<_, ClientError>((job.path, bytes))
            }
        }))
        .buffer_unordered(self.options.max_concurrent_fetches.max(1))
        .try_collect()
        .await
        .inspect_err(|e| {
            tracing::warn!(uuid, error = %e, "closure download aborted; nothing persisted");
        })?;

        // Stage in path order so the persisted list is deterministic
        let mut staged = self.store.begin().await?;
        let ordered: std::collections::BTreeMap<String, Bytes> = fetched.into_iter().collect();
        for (path, bytes) in &ordered {
            staged.stage(path, bytes).await?;
        }
        let persisted = staged.commit().await?;
        tracing::info!(uuid, files = persisted.len(), "installed artifact closure");
        Ok(persisted)
    }

    /// Resolve an installed artifact's configuration inheritance chain.
    ///
    /// Loads the target's installed document, then resolves ancestors
    /// against the conventional search locations inside this repository's
    /// cache, merging the target last.
    pub async fn resolve_config(&self, uuid: &str) -> Result<Resolution, ClientError> {
        let verified =
            self.current()
                .await
                .ok_or_else(|| ClientError::NoManifest {
                    namespace: self.repo.namespace.to_string(),
                })?;
        let record = verified.index().by_uuid(uuid).ok_or_else(|| {
            ClientError::ArtifactNotFound {
                id: uuid.to_string(),
            }
        })?;

        let path = self.store.artifact_path(&record.path);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ResolveError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        let target = ConfigDocument::from_slice(&bytes)?;

        let source =
            SearchPathSource::new(self.store.root(), &record.slicer, record.kind.as_str());
        let resolution = ChainResolver::new(source).resolve(&target).await?;
        tracing::debug!(
            uuid,
            chain = resolution.order.len(),
            "resolved configuration inheritance chain"
        );
        Ok(resolution)
    }
}
