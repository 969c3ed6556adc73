//! Inheritance chain resolution against a document source.
//!
//! The resolver is deliberately ignorant of where documents live: a
//! [`DocumentSource`] answers "give me the document named X, if you have
//! it". The conventional on-disk search locations (`base/`, `<kind>/base/`,
//! `system/`) are one such source, [`SearchPathSource`], built from an
//! ordered list of path templates so packaging conventions stay injectable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use smol_str::SmolStr;

use crate::document::ConfigDocument;
use crate::error::ResolveError;
use crate::merge::{MergedDocument, Provenance, merge};
use crate::walk::walk_inheritance;

/// Named lookup of configuration documents.
///
/// `load` returns `Ok(None)` when the source simply does not know the name;
/// reserve errors for documents that exist but cannot be read or parsed.
#[trait_variant::make(Send)]
pub trait DocumentSource {
    /// Load the document named `name`, if this source has it
    async fn load(&self, name: &str) -> Result<Option<ConfigDocument>, ResolveError>;
}

/// The default search-path templates, mirroring the conventional repository
/// layout. `{slicer}`, `{kind}`, and `{name}` are substituted per query.
pub const DEFAULT_SEARCH_TEMPLATES: &[&str] = &[
    "slicers/{slicer}/base/{name}.json",
    "slicers/{slicer}/{kind}/base/{name}.json",
    "slicers/{slicer}/system/{name}.json",
];

/// Filesystem-backed document source over an ordered list of path templates.
#[derive(Debug, Clone)]
pub struct SearchPathSource {
    root: PathBuf,
    templates: Vec<String>,
}

impl SearchPathSource {
    /// Source over the conventional locations for one `(slicer, kind)` pair
    pub fn new(root: impl Into<PathBuf>, slicer: &str, kind: &str) -> Self {
        let templates = DEFAULT_SEARCH_TEMPLATES
            .iter()
            .map(|t| t.replace("{slicer}", slicer).replace("{kind}", kind))
            .collect();
        Self {
            root: root.into(),
            templates,
        }
    }

    /// Source over caller-provided templates (each containing `{name}`)
    pub fn with_templates(root: impl Into<PathBuf>, templates: Vec<String>) -> Self {
        Self {
            root: root.into(),
            templates,
        }
    }

    /// The candidate paths for `name`, in search order
    pub fn candidate_paths(&self, name: &str) -> Vec<PathBuf> {
        self.templates
            .iter()
            .map(|t| self.root.join(t.replace("{name}", name)))
            .collect()
    }
}

impl DocumentSource for SearchPathSource {
    async fn load(&self, name: &str) -> Result<Option<ConfigDocument>, ResolveError> {
        for path in self.candidate_paths(name) {
            match tokio::fs::read(&path).await {
                Ok(bytes) => return ConfigDocument::from_slice(&bytes).map(Some),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(ResolveError::Io {
                        path: path.display().to_string(),
                        source: e,
                    });
                }
            }
        }
        Ok(None)
    }
}

/// The outcome of one resolution request.
///
/// Transient and caller-owned: compute it, use it, discard it. `order` is
/// the full merge order — most distant ancestor first, the target itself
/// last.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Merge order, target included as the final element
    pub order: Vec<SmolStr>,
    /// The flattened configuration
    pub merged: MergedDocument,
    /// Which document last set each leaf field
    pub provenance: Provenance,
}

/// Resolves a document's inheritance chain and merges it flat.
#[derive(Debug, Clone)]
pub struct ChainResolver<S> {
    source: S,
}

impl<S: DocumentSource + Sync> ChainResolver<S> {
    /// Create a resolver over a document source
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Resolve `target`'s full inheritance chain into one document.
    ///
    /// Ancestors load strictly sequentially — each step's lookup depends on
    /// the parent pointer of the previous document. Loading stops as soon
    /// as a name repeats; the chain walker then produces the canonical
    /// order or the [`ResolveError::Circular`] naming the closing node.
    pub async fn resolve(&self, target: &ConfigDocument) -> Result<Resolution, ResolveError> {
        let mut ancestors: BTreeMap<SmolStr, ConfigDocument> = BTreeMap::new();
        let mut cursor = target.inherits().map(SmolStr::new);
        while let Some(name) = cursor {
            if name == target.name() || ancestors.contains_key(&name) {
                break;
            }
            let doc = self
                .source
                .load(&name)
                .await?
                .ok_or_else(|| ResolveError::NotFound {
                    name: name.to_string(),
                })?;
            cursor = doc.inherits().map(SmolStr::new);
            ancestors.insert(name, doc);
        }

        let chain = walk_inheritance(target.name(), |id| {
            if id == target.name() {
                Ok(target.inherits().map(SmolStr::new))
            } else {
                ancestors
                    .get(id)
                    .map(|doc| doc.inherits().map(SmolStr::new))
                    .ok_or_else(|| ResolveError::NotFound {
                        name: id.to_string(),
                    })
            }
        })?;

        let mut order = chain.clone();
        order.push(SmolStr::new(target.name()));

        let sequence = chain
            .iter()
            .map(|name| (name.clone(), &ancestors[name]))
            .chain(std::iter::once((SmolStr::new(target.name()), target)));
        let (merged, provenance) = merge(sequence);

        Ok(Resolution {
            order,
            merged,
            provenance,
        })
    }
}

/// In-memory document source, primarily for tests and pre-loaded sets.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: BTreeMap<SmolStr, ConfigDocument>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its own `config.name`
    pub fn insert(&mut self, document: ConfigDocument) {
        self.documents
            .insert(SmolStr::new(document.name()), document);
    }
}

impl DocumentSource for MemorySource {
    async fn load(&self, name: &str) -> Result<Option<ConfigDocument>, ResolveError> {
        Ok(self.documents.get(name).cloned())
    }
}

/// Convenience: resolve against the search paths rooted at `root`.
pub async fn resolve_at(
    root: &Path,
    slicer: &str,
    kind: &str,
    target: &ConfigDocument,
) -> Result<Resolution, ResolveError> {
    ChainResolver::new(SearchPathSource::new(root, slicer, kind))
        .resolve(target)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: &str, inherits: Option<&str>, fields: serde_json::Value) -> ConfigDocument {
        let mut root = fields;
        let mut config = serde_json::Map::new();
        config.insert("name".to_string(), json!(name));
        if let Some(parent) = inherits {
            config.insert("inherits".to_string(), json!(parent));
        }
        root.as_object_mut()
            .unwrap()
            .insert("config".to_string(), serde_json::Value::Object(config));
        ConfigDocument::from_value(root).unwrap()
    }

    fn source(docs: Vec<ConfigDocument>) -> MemorySource {
        let mut source = MemorySource::new();
        for doc in docs {
            source.insert(doc);
        }
        source
    }

    #[tokio::test]
    async fn test_resolve_three_level_chain() {
        let resolver = ChainResolver::new(source(vec![
            doc("base", None, json!({ "speed": { "outer": 40, "inner": 80 }, "retract": 1.0 })),
            doc("mid", Some("base"), json!({ "speed": { "outer": 55 } })),
        ]));
        let target = doc("leaf", Some("mid"), json!({ "retract": 0.4 }));

        let resolution = resolver.resolve(&target).await.unwrap();
        assert_eq!(resolution.order, vec!["base", "mid", "leaf"]);
        assert_eq!(resolution.merged["speed"], json!({ "outer": 55, "inner": 80 }));
        assert_eq!(resolution.merged["retract"], json!(0.4));
        assert_eq!(resolution.provenance.source_of("speed.outer"), Some("mid"));
        assert_eq!(resolution.provenance.source_of("speed.inner"), Some("base"));
        assert_eq!(resolution.provenance.source_of("retract"), Some("leaf"));
    }

    #[tokio::test]
    async fn test_resolve_no_inheritance() {
        let resolver = ChainResolver::new(source(vec![]));
        let target = doc("lone", None, json!({ "x": 1 }));
        let resolution = resolver.resolve(&target).await.unwrap();
        assert_eq!(resolution.order, vec!["lone"]);
        assert_eq!(resolution.merged["x"], json!(1));
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let resolver = ChainResolver::new(source(vec![doc(
            "base",
            None,
            json!({ "a": { "b": 1 } }),
        )]));
        let target = doc("leaf", Some("base"), json!({ "a": { "c": 2 } }));
        let first = resolver.resolve(&target).await.unwrap();
        let second = resolver.resolve(&target).await.unwrap();
        assert_eq!(first.order, second.order);
        assert_eq!(
            serde_json::to_vec(&first.merged).unwrap(),
            serde_json::to_vec(&second.merged).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let resolver = ChainResolver::new(source(vec![]));
        let target = doc("leaf", Some("ghost"), json!({}));
        let err = resolver.resolve(&target).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { name } if name == "ghost"));
    }

    #[tokio::test]
    async fn test_self_inheritance_is_circular() {
        let resolver = ChainResolver::new(source(vec![]));
        let target = doc("ouroboros", Some("ouroboros"), json!({}));
        let err = resolver.resolve(&target).await.unwrap_err();
        assert!(matches!(err, ResolveError::Circular { id } if id == "ouroboros"));
    }

    #[tokio::test]
    async fn test_cycle_through_ancestors_is_circular() {
        let resolver = ChainResolver::new(source(vec![
            doc("a", Some("b"), json!({})),
            doc("b", Some("a"), json!({})),
        ]));
        let target = doc("leaf", Some("a"), json!({}));
        let err = resolver.resolve(&target).await.unwrap_err();
        assert!(matches!(err, ResolveError::Circular { id } if id == "a"));
    }

    #[tokio::test]
    async fn test_search_path_source_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let base = root.join("slicers/orcaslicer/base");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(
            base.join("shared.json"),
            serde_json::to_vec(&json!({ "config": { "name": "shared" }, "speed": 40 })).unwrap(),
        )
        .unwrap();

        let source = SearchPathSource::new(root, "orcaslicer", "filament");
        let loaded = source.load("shared").await.unwrap().unwrap();
        assert_eq!(loaded.name(), "shared");
        assert!(source.load("absent").await.unwrap().is_none());

        // Templates substitute slicer and kind at construction
        let candidates = source.candidate_paths("x");
        assert_eq!(candidates.len(), 3);
        assert!(candidates[1].ends_with("slicers/orcaslicer/filament/base/x.json"));
    }
}
