//! Artifact records: one entry in a manifest's profile list.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;

/// Artifact type tag.
///
/// The well-known kinds get variants; anything else round-trips through
/// [`ArtifactKind::Other`] so a newer publisher does not break older
/// clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Printer (machine) profile
    Printer,
    /// Filament profile
    Filament,
    /// Process (print settings) profile
    Process,
    /// Shared base configuration other profiles inherit from
    Base,
    /// A kind this client does not know about
    Other(SmolStr),
}

impl ArtifactKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &str {
        match self {
            Self::Printer => "printer",
            Self::Filament => "filament",
            Self::Process => "process",
            Self::Base => "base",
            Self::Other(tag) => tag,
        }
    }

    /// Parse a wire name (case-insensitive for the well-known kinds)
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "printer" => Self::Printer,
            "filament" => Self::Filament,
            "process" => Self::Process,
            "base" => Self::Base,
            _ => Self::Other(SmolStr::new(tag)),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ArtifactKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ArtifactKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = SmolStr::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}

/// One artifact in a manifest.
///
/// `uuid` is the stable identifier (never reused by contract); `name` is the
/// human display name, unique only as a convenience. `dependencies` is the
/// unordered set of artifacts required alongside this one; `inherits` is the
/// single-ancestor pointer used by configuration inheritance. The two edge
/// kinds are deliberately separate fields with separate traversal semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Stable opaque identifier, unique within one manifest
    pub uuid: SmolStr,
    /// Human display name
    pub name: SmolStr,
    /// Artifact type tag (`type` on the wire)
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    /// Slicer this profile targets (e.g. `orcaslicer`, `prusaslicer`)
    pub slicer: SmolStr,
    /// Semantic-version string, kept opaque by this client
    pub version: SmolStr,
    /// Storage path relative to the repository origin
    pub path: String,
    /// Identifiers of artifacts this one requires
    #[serde(default)]
    pub dependencies: Vec<SmolStr>,
    /// Single-parent inheritance pointer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits: Option<SmolStr>,
    /// Publisher timestamp (ISO-8601)
    pub last_updated: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Display name normalized for lookup: trimmed, ASCII-lowercased
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Normalize a display name for index lookup
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        assert_eq!(ArtifactKind::parse("Printer"), ArtifactKind::Printer);
        assert_eq!(ArtifactKind::parse("filament").as_str(), "filament");
        let other = ArtifactKind::parse("resin");
        assert_eq!(other, ArtifactKind::Other(SmolStr::new("resin")));
        assert_eq!(other.as_str(), "resin");
    }

    #[test]
    fn test_record_wire_format() {
        let json = r#"{
            "uuid": "a1b2",
            "name": "Generic PLA",
            "type": "filament",
            "slicer": "orcaslicer",
            "version": "1.2.0",
            "path": "slicers/orcaslicer/filaments/pla/generic-pla.json",
            "dependencies": ["c3d4"],
            "inherits": "e5f6",
            "last_updated": "2025-11-02T10:00:00Z"
        }"#;
        let record: ArtifactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.uuid, "a1b2");
        assert_eq!(record.kind, ArtifactKind::Filament);
        assert_eq!(record.dependencies, vec![SmolStr::new("c3d4")]);
        assert_eq!(record.inherits.as_deref(), Some("e5f6"));
        assert_eq!(record.normalized_name(), "generic pla");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["type"], "filament");
    }

    #[test]
    fn test_dependencies_default_empty() {
        let json = r#"{
            "uuid": "a1b2",
            "name": "Voron 0.2",
            "type": "printer",
            "slicer": "prusaslicer",
            "version": "0.1.0",
            "path": "p.json",
            "last_updated": "2025-11-02T10:00:00Z"
        }"#;
        let record: ArtifactRecord = serde_json::from_str(json).unwrap();
        assert!(record.dependencies.is_empty());
        assert!(record.inherits.is_none());
    }
}
