//! Manifest wire format.
//!
//! ```json
//! {
//!   "spec_version": "1.0",
//!   "namespace": "voron_official",
//!   "profiles": [ { ...ArtifactRecord... } ],
//!   "checksums": { "slicers/orca/f/pla.json": "sha256:ab12..." }
//! }
//! ```
//!
//! A manifest is parsed once from verified bytes and never mutated; a
//! repository refresh builds a whole new manifest and swaps it in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ManifestError;
use crate::record::ArtifactRecord;

/// Spec versions this client understands (major version 1)
pub const SUPPORTED_SPEC_MAJOR: &str = "1";

/// A repository's signed catalog: artifact records plus checksum table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub spec_version: SmolStr,
    /// Namespace of the publishing repository
    pub namespace: SmolStr,
    /// Every artifact the repository publishes
    pub profiles: Vec<ArtifactRecord>,
    /// Path → `<algorithm>:<hexdigest>` for every stored artifact
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

impl Manifest {
    /// Parse a manifest from its raw (already signature-verified) bytes.
    ///
    /// Performs structural validation only: JSON shape, non-empty
    /// namespace, and a spec version this client understands. Uniqueness of
    /// uuids is enforced by [`crate::index::ManifestIndex::build`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ManifestError> {
        let manifest: Manifest =
            serde_json::from_slice(bytes).map_err(|e| ManifestError::Malformed {
                reason: e.to_string(),
            })?;
        if manifest.namespace.trim().is_empty() {
            return Err(ManifestError::Malformed {
                reason: "namespace must be non-empty".to_string(),
            });
        }
        let major = manifest
            .spec_version
            .split('.')
            .next()
            .unwrap_or_default();
        if major != SUPPORTED_SPEC_MAJOR {
            return Err(ManifestError::Malformed {
                reason: format!("unsupported spec_version: {}", manifest.spec_version),
            });
        }
        Ok(manifest)
    }

    /// The published checksum for a storage path, if any
    pub fn checksum_for(&self, path: &str) -> Option<&str> {
        self.checksums.get(path).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(spec_version: &str, namespace: &str) -> String {
        format!(
            r#"{{"spec_version":"{spec_version}","namespace":"{namespace}","profiles":[],"checksums":{{"a.json":"sha256:00ff"}}}}"#
        )
    }

    #[test]
    fn test_parse_minimal() {
        let manifest = Manifest::from_slice(minimal("1.0", "voron_official").as_bytes()).unwrap();
        assert_eq!(manifest.namespace, "voron_official");
        assert_eq!(manifest.checksum_for("a.json"), Some("sha256:00ff"));
        assert_eq!(manifest.checksum_for("missing.json"), None);
    }

    #[test]
    fn test_rejects_empty_namespace() {
        assert!(matches!(
            Manifest::from_slice(minimal("1.0", "  ").as_bytes()),
            Err(ManifestError::Malformed { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_spec_version() {
        assert!(matches!(
            Manifest::from_slice(minimal("2.0", "ns").as_bytes()),
            Err(ManifestError::Malformed { .. })
        ));
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(Manifest::from_slice(b"not json").is_err());
    }
}
