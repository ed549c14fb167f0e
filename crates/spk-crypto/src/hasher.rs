use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use spk_types::base::{CLOSURE, ID};
use spk_types::object::OBJECT_ID_LEN;
use spk_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so ids from different hashers never collide on identical
/// bytes. Digests are truncated to the 128 bits of an [`ObjectId`].
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for traversed base objects.
    pub const OBJECT: Self = Self {
        domain: "spk-object-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        let digest = hasher.finalize();
        let mut id = [0u8; OBJECT_ID_LEN];
        id.copy_from_slice(&digest.as_bytes()[..OBJECT_ID_LEN]);
        ObjectId::from_hash(id)
    }

    /// Hash the field set of a traversed object.
    ///
    /// `id` and `__closure` at the top level are ignored, so the result is
    /// the same before and after they are assigned.
    pub fn hash_object(&self, object: &Map<String, Value>) -> Result<ObjectId, HasherError> {
        Ok(self.hash(canonical_text(object)?.as_bytes()))
    }
}

/// Canonical JSON text of an object's hashed field set.
///
/// Keys are emitted in sorted order at every nesting level, independent of
/// how the map was built. Top-level `id` and `__closure` are left out.
pub fn canonical_text(object: &Map<String, Value>) -> Result<String, HasherError> {
    serde_json::to_string(&HashedFields(object)).map_err(|e| HasherError::Serialization(e.to_string()))
}

struct HashedFields<'a>(&'a Map<String, Value>);

impl Serialize for HashedFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<_> = self
            .0
            .iter()
            .filter(|(key, _)| key.as_str() != ID && key.as_str() != CLOSURE)
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, &Sorted(value))?;
        }
        map.end()
    }
}

struct Sorted<'a>(&'a Value);

impl Serialize for Sorted<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(object) => {
                let mut entries: Vec<_> = object.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, &Sorted(value))?;
                }
                map.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Sorted(item))?;
                }
                seq.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn hash_is_deterministic() {
        let object = map(json!({ "speckle_type": "Point", "x": 1, "y": 2 }));
        let id1 = ContentHasher::OBJECT.hash_object(&object).unwrap();
        let id2 = ContentHasher::OBJECT.hash_object(&object).unwrap();
        assert_eq!(id1, id2);
        assert!(!id1.is_null());
    }

    #[test]
    fn id_and_closure_are_ignored() {
        let bare = map(json!({ "speckle_type": "Point", "x": 1 }));
        let stamped = map(json!({
            "speckle_type": "Point",
            "x": 1,
            "id": "0123456789abcdef0123456789abcdef",
            "__closure": { "0123456789abcdef0123456789abcdef": 1 }
        }));
        assert_eq!(
            ContentHasher::OBJECT.hash_object(&bare).unwrap(),
            ContentHasher::OBJECT.hash_object(&stamped).unwrap()
        );
    }

    #[test]
    fn nested_id_is_hashed() {
        let a = map(json!({ "speckle_type": "A", "child": { "id": "x" } }));
        let b = map(json!({ "speckle_type": "A", "child": { "id": "y" } }));
        assert_ne!(
            ContentHasher::OBJECT.hash_object(&a).unwrap(),
            ContentHasher::OBJECT.hash_object(&b).unwrap()
        );
    }

    #[test]
    fn field_change_changes_hash() {
        let a = map(json!({ "speckle_type": "Point", "x": 1 }));
        let b = map(json!({ "speckle_type": "Point", "x": 2 }));
        assert_ne!(
            ContentHasher::OBJECT.hash_object(&a).unwrap(),
            ContentHasher::OBJECT.hash_object(&b).unwrap()
        );
    }

    #[test]
    fn canonical_text_sorts_keys() {
        let object = map(json!({ "b": { "z": 1, "a": [ { "y": 1, "x": 2 } ] }, "a": true }));
        assert_eq!(
            canonical_text(&object).unwrap(),
            r#"{"a":true,"b":{"a":[{"x":2,"y":1}],"z":1}}"#
        );
    }

    #[test]
    fn hash_is_domain_separated() {
        let plain = blake3::hash(b"data");
        let id = ContentHasher::OBJECT.hash(b"data");
        assert_ne!(&plain.as_bytes()[..OBJECT_ID_LEN], id.as_bytes());
    }

    proptest! {
        #[test]
        fn insertion_order_does_not_matter(entries in proptest::collection::vec(("[a-z]{1,6}", any::<i64>()), 0..12)) {
            let forward: Map<String, Value> = entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let backward: Map<String, Value> = entries.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();
            // Later duplicates win in `forward`, earlier ones in `backward`; only compare when keys are unique.
            prop_assume!(forward.len() == entries.len());
            prop_assert_eq!(
                ContentHasher::OBJECT.hash_object(&forward).unwrap(),
                ContentHasher::OBJECT.hash_object(&backward).unwrap()
            );
        }
    }
}
