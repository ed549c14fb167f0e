use serde_json::{Map, Value};
use spk_crypto::ContentHasher;
use spk_types::base::{CLOSURE, ID, REFERENCED_ID, REFERENCE_TYPE, SPECKLE_TYPE};
use spk_types::{Closure, ObjectId};

use crate::error::{StoreError, StoreResult};

/// A fully traversed object: every nested base object is either inlined in
/// traversed form or replaced by a reference, and the body carries the final
/// `id` (and `__closure` when non-empty).
///
/// The store never re-interprets the body beyond hashing it and listing the
/// references it contains.
#[derive(Clone, Debug, PartialEq)]
pub struct TraversedObject {
    id: ObjectId,
    closure: Closure,
    body: Map<String, Value>,
}

impl TraversedObject {
    /// Assemble from traversal output.
    ///
    /// `body` must already carry `id` and `__closure`; the traverser stamps
    /// them before storing.
    pub fn from_parts(id: ObjectId, closure: Closure, body: Map<String, Value>) -> Self {
        Self { id, closure, body }
    }

    /// Decode a traversed object from its JSON form (e.g. a parsed batch).
    pub fn from_value(value: Value) -> StoreResult<Self> {
        let Value::Object(body) = value else {
            return Err(StoreError::CorruptObject {
                reason: "traversed object is not a JSON object".into(),
            });
        };
        let id = body
            .get(ID)
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::CorruptObject {
                reason: "missing id".into(),
            })
            .and_then(|hex| {
                ObjectId::from_hex(hex).map_err(|e| StoreError::CorruptObject {
                    reason: e.to_string(),
                })
            })?;
        let closure = match body.get(CLOSURE) {
            Some(value) => Closure::from_value(value).map_err(|e| StoreError::CorruptObject {
                reason: e.to_string(),
            })?,
            None => Closure::new(),
        };
        Ok(Self { id, closure, body })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn closure(&self) -> &Closure {
        &self.closure
    }

    pub fn speckle_type(&self) -> Option<&str> {
        self.body.get(SPECKLE_TYPE).and_then(Value::as_str)
    }

    /// A single property of the traversed body.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }

    /// JSON text of the complete object, as sent to a server.
    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string(&self.body).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Recompute the content hash of the body.
    pub fn compute_id(&self) -> StoreResult<ObjectId> {
        ContentHasher::OBJECT
            .hash_object(&self.body)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Every `referencedId` found anywhere in the body, in encounter order.
    pub fn references(&self) -> Vec<ObjectId> {
        let mut found = Vec::new();
        for (key, value) in &self.body {
            if key != CLOSURE {
                collect_references(value, &mut found);
            }
        }
        found
    }
}

fn collect_references(value: &Value, found: &mut Vec<ObjectId>) {
    match value {
        Value::Object(map) => {
            let is_reference = map.get(SPECKLE_TYPE).and_then(Value::as_str) == Some(REFERENCE_TYPE);
            if is_reference {
                if let Some(id) = map
                    .get(REFERENCED_ID)
                    .and_then(Value::as_str)
                    .and_then(|hex| ObjectId::from_hex(hex).ok())
                {
                    found.push(id);
                }
                return;
            }
            for (key, nested) in map {
                if key != CLOSURE {
                    collect_references(nested, found);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_references(item, found)),
        _ => {}
    }
}
