//! All-or-nothing artifact persistence.
//!
//! Closure downloads never write into the cache directly. They stage into a
//! temporary directory created *inside* the cache root (same filesystem, so
//! the final move is a rename), and only a successful [`StagedInstall::commit`]
//! makes anything visible. Dropping the staging handle — on a digest
//! mismatch, a fetch failure, or a panic — removes every partial file with
//! it.

use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;

use crate::error::ClientError;

/// Filesystem cache for installed artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Store rooted at `root` (created lazily on first staging)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final on-disk location for a manifest storage path
    pub fn artifact_path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Begin a staged install
    pub async fn begin(&self) -> Result<StagedInstall, ClientError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)?;
        Ok(StagedInstall {
            staging,
            root: self.root.clone(),
            files: Vec::new(),
        })
    }
}

/// An in-progress install: staged files awaiting commit.
///
/// Dropping this without calling [`commit`](Self::commit) discards every
/// staged file.
#[derive(Debug)]
pub struct StagedInstall {
    staging: TempDir,
    root: PathBuf,
    files: Vec<String>,
}

impl StagedInstall {
    /// Stage verified bytes under a manifest storage path.
    ///
    /// The path must stay inside the cache root: absolute paths and parent
    /// traversal are rejected, since storage paths come from a manifest the
    /// operator did not write.
    pub async fn stage(&mut self, rel: &str, bytes: &[u8]) -> Result<(), ClientError> {
        let path = Path::new(rel);
        let safe = !rel.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ClientError::UnsafePath {
                path: rel.to_string(),
            });
        }
        let dest = self.staging.path().join(path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, bytes).await?;
        self.files.push(rel.to_string());
        Ok(())
    }

    /// Number of files staged so far
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing has been staged
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Move every staged file into the cache root, returning final paths.
    pub async fn commit(self) -> Result<Vec<PathBuf>, ClientError> {
        let mut persisted = Vec::with_capacity(self.files.len());
        for rel in &self.files {
            let from = self.staging.path().join(rel);
            let to = self.root.join(rel);
            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::rename(&from, &to).await?;
            persisted.push(to);
        }
        Ok(persisted)
    }
}
