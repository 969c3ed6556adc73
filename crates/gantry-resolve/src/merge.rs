//! Ordered deep merge with provenance.
//!
//! Documents are merged left to right into an accumulator. When both sides
//! hold an object for the same key the merge recurses; in every other case
//! the incoming value replaces the accumulated one outright — arrays and
//! scalars are whole-value replacements, never element-wise merges.
//!
//! Provenance maps every leaf field path (dotted, e.g. `temperature.nozzle`)
//! to the identifier of the last document that set it. Replacing a subtree
//! with a non-object drops the provenance of every leaf formerly nested
//! under it.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::document::ConfigDocument;

/// The flattened result of a merge: a plain JSON object
pub type MergedDocument = Map<String, Value>;

/// Which document last set each leaf field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    leaves: BTreeMap<String, SmolStr>,
}

impl Provenance {
    /// The identifier of the document that last set `path`
    pub fn source_of(&self, path: &str) -> Option<&str> {
        self.leaves.get(path).map(SmolStr::as_str)
    }

    /// Iterate over `(leaf path, source id)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.leaves.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of tracked leaves
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether no leaves are tracked
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    fn record(&mut self, path: &str, source: &SmolStr) {
        self.leaves.insert(path.to_string(), source.clone());
    }

    /// Drop `path` and every leaf nested under it
    fn invalidate_under(&mut self, path: &str) {
        let prefix = format!("{path}.");
        self.leaves
            .retain(|leaf, _| leaf != path && !leaf.starts_with(&prefix));
    }

    /// Record every leaf reachable inside `value` as set by `source`
    fn record_leaves(&mut self, path: &str, value: &Value, source: &SmolStr) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.record_leaves(&join(path, key), child, source);
                }
            }
            _ => self.record(path, source),
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Merge documents in order, returning the flattened result and provenance.
///
/// Each pair is `(identifier, document)`; the identifier is what provenance
/// reports for fields the document set last. Deterministic and idempotent
/// for a fixed input sequence.
pub fn merge<'a>(
    ordered: impl IntoIterator<Item = (SmolStr, &'a ConfigDocument)>,
) -> (MergedDocument, Provenance) {
    let mut merged = MergedDocument::new();
    let mut provenance = Provenance::default();
    for (id, document) in ordered {
        merge_map(&mut merged, document.fields(), "", &id, &mut provenance);
    }
    (merged, provenance)
}

fn merge_map(
    acc: &mut Map<String, Value>,
    incoming: &Map<String, Value>,
    path: &str,
    source: &SmolStr,
    provenance: &mut Provenance,
) {
    for (key, value) in incoming {
        let leaf_path = join(path, key);
        match (acc.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(update)) => {
                merge_map(existing, update, &leaf_path, source, provenance);
            }
            _ => {
                // Whole-value replacement: any provenance recorded beneath
                // this path belongs to a subtree that no longer exists.
                provenance.invalidate_under(&leaf_path);
                provenance.record_leaves(&leaf_path, value, source);
                acc.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: &str, fields: Value) -> ConfigDocument {
        let mut root = fields;
        root.as_object_mut()
            .unwrap()
            .insert("config".to_string(), json!({ "name": name }));
        ConfigDocument::from_value(root).unwrap()
    }

    fn merge_all(docs: &[ConfigDocument]) -> (MergedDocument, Provenance) {
        merge(docs.iter().map(|d| (SmolStr::new(d.name()), d)))
    }

    #[test]
    fn test_nested_keys_merge_recursively() {
        let parent = doc("P", json!({ "a": { "x": 1, "y": 2 } }));
        let child = doc("C", json!({ "a": { "y": 3 } }));
        let (merged, _) = merge_all(&[parent, child]);
        assert_eq!(merged["a"], json!({ "x": 1, "y": 3 }));
    }

    #[test]
    fn test_scalar_replaces_whole_subtree() {
        let parent = doc("P", json!({ "a": { "x": 1 } }));
        let child = doc("C", json!({ "a": 5 }));
        let (merged, provenance) = merge_all(&[parent, child]);
        assert_eq!(merged["a"], json!(5));
        // The replaced subtree's leaves are gone from provenance too
        assert_eq!(provenance.source_of("a.x"), None);
        assert_eq!(provenance.source_of("a"), Some("C"));
    }

    #[test]
    fn test_arrays_replace_not_merge() {
        let parent = doc("P", json!({ "fans": [1, 2, 3] }));
        let child = doc("C", json!({ "fans": [9] }));
        let (merged, _) = merge_all(&[parent, child]);
        assert_eq!(merged["fans"], json!([9]));
    }

    #[test]
    fn test_provenance_last_writer_wins() {
        let parent = doc("P", json!({ "a": { "x": 1 } }));
        let child = doc("C", json!({ "a": { "x": 2 } }));
        let (_, provenance) = merge_all(&[parent, child]);
        assert_eq!(provenance.source_of("a.x"), Some("C"));
    }

    #[test]
    fn test_untouched_fields_keep_their_source() {
        let parent = doc("P", json!({ "a": { "x": 1, "y": 2 } }));
        let child = doc("C", json!({ "a": { "y": 3 }, "b": true }));
        let (_, provenance) = merge_all(&[parent, child]);
        assert_eq!(provenance.source_of("a.x"), Some("P"));
        assert_eq!(provenance.source_of("a.y"), Some("C"));
        assert_eq!(provenance.source_of("b"), Some("C"));
    }

    #[test]
    fn test_object_replacing_scalar_records_new_leaves() {
        let parent = doc("P", json!({ "a": 5 }));
        let child = doc("C", json!({ "a": { "x": 1 } }));
        let (merged, provenance) = merge_all(&[parent, child]);
        assert_eq!(merged["a"], json!({ "x": 1 }));
        assert_eq!(provenance.source_of("a"), None);
        assert_eq!(provenance.source_of("a.x"), Some("C"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let docs = vec![
            doc("base", json!({ "speed": { "outer": 40, "inner": 80 } })),
            doc("fast", json!({ "speed": { "outer": 60 }, "accel": 5000 })),
        ];
        let first = merge_all(&docs);
        let second = merge_all(&docs);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first.0).unwrap(),
            serde_json::to_vec(&second.0).unwrap()
        );
    }
}
