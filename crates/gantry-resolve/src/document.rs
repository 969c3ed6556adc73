//! Configuration documents.
//!
//! A document is an arbitrary JSON object with one reserved top-level key,
//! `config`, holding `name` (required), `inherits` (optional parent
//! identifier), and `from` (optional provenance label). The `config` object
//! itself participates in merging like any other field.

use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::error::ResolveError;

/// A parsed configuration document.
///
/// The reserved metadata is extracted at construction so accessors are
/// infallible; the full field map (including `config`) stays available for
/// merging.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    name: SmolStr,
    inherits: Option<SmolStr>,
    from: Option<SmolStr>,
    fields: Map<String, Value>,
}

impl ConfigDocument {
    /// Parse a document from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ResolveError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ResolveError::Malformed {
                reason: e.to_string(),
            })?;
        Self::from_value(value)
    }

    /// Build a document from an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, ResolveError> {
        let Value::Object(fields) = value else {
            return Err(ResolveError::Malformed {
                reason: "document root must be a JSON object".to_string(),
            });
        };
        let config = fields
            .get("config")
            .and_then(Value::as_object)
            .ok_or(ResolveError::MissingName)?;
        let name = config
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .ok_or(ResolveError::MissingName)?;
        let reserved = |key: &str| config.get(key).and_then(Value::as_str).map(SmolStr::new);
        Ok(Self {
            name: SmolStr::new(name),
            inherits: reserved("inherits"),
            from: reserved("from"),
            fields,
        })
    }

    /// The document's own name (`config.name`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent identifier (`config.inherits`), if any
    pub fn inherits(&self) -> Option<&str> {
        self.inherits.as_deref()
    }

    /// The provenance label (`config.from`), if any
    pub fn from_label(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Every field of the document, `config` included
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_document() {
        let doc = ConfigDocument::from_value(json!({
            "config": { "name": "generic-pla", "inherits": "base-filament", "from": "system" },
            "temperature": { "nozzle": 210, "bed": 60 }
        }))
        .unwrap();
        assert_eq!(doc.name(), "generic-pla");
        assert_eq!(doc.inherits(), Some("base-filament"));
        assert_eq!(doc.from_label(), Some("system"));
        assert!(doc.fields().contains_key("temperature"));
        assert!(doc.fields().contains_key("config"));
    }

    #[test]
    fn test_inherits_optional() {
        let doc = ConfigDocument::from_value(json!({
            "config": { "name": "root" }
        }))
        .unwrap();
        assert_eq!(doc.inherits(), None);
        assert_eq!(doc.from_label(), None);
    }

    #[test]
    fn test_missing_name_rejected() {
        assert!(matches!(
            ConfigDocument::from_value(json!({ "config": {} })),
            Err(ResolveError::MissingName)
        ));
        assert!(matches!(
            ConfigDocument::from_value(json!({ "config": { "name": "  " } })),
            Err(ResolveError::MissingName)
        ));
        assert!(matches!(
            ConfigDocument::from_value(json!({ "temperature": 210 })),
            Err(ResolveError::MissingName)
        ));
    }

    #[test]
    fn test_non_object_root_rejected() {
        assert!(ConfigDocument::from_slice(b"[1,2,3]").is_err());
        assert!(ConfigDocument::from_slice(b"not json").is_err());
    }
}
