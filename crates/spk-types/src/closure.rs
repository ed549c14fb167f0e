use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::object::ObjectId;

/// Detached descendants of an object, each with the minimum depth at which it
/// is reachable.
///
/// Only detached descendants appear here; inlined children are part of the
/// owner's own content. Serialized as the `__closure` map of a traversed
/// object: `{ "<hex id>": depth, ... }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Closure(BTreeMap<ObjectId, u32>);

impl Closure {
    /// Create an empty closure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` at `depth`, keeping the smaller depth if already present.
    pub fn record_min(&mut self, id: ObjectId, depth: u32) {
        self.0
            .entry(id)
            .and_modify(|d| *d = (*d).min(depth))
            .or_insert(depth);
    }

    /// Depth of `id`, if it is part of the closure.
    pub fn depth(&self, id: &ObjectId) -> Option<u32> {
        self.0.get(id).copied()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in id order.
    pub fn iter(&self) -> btree_map::Iter<'_, ObjectId, u32> {
        self.0.iter()
    }

    /// Ids in the closure, in id order.
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.0.keys()
    }

    /// JSON form used as the `__closure` property.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(id, depth)| (id.to_hex(), Value::from(*depth)))
                .collect(),
        )
    }

    /// Parse a `__closure` JSON map.
    pub fn from_value(value: &Value) -> Result<Self, TypeError> {
        let map = value
            .as_object()
            .ok_or_else(|| TypeError::MalformedReference("closure is not a map".into()))?;
        let mut closure = Self::new();
        for (key, depth) in map {
            let id = ObjectId::from_hex(key)?;
            let depth = depth
                .as_u64()
                .and_then(|d| u32::try_from(d).ok())
                .ok_or_else(|| {
                    TypeError::MalformedReference(format!("closure depth for {key} is not a u32"))
                })?;
            closure.record_min(id, depth);
        }
        Ok(closure)
    }
}

impl FromIterator<(ObjectId, u32)> for Closure {
    fn from_iter<I: IntoIterator<Item = (ObjectId, u32)>>(iter: I) -> Self {
        let mut closure = Self::new();
        for (id, depth) in iter {
            closure.record_min(id, depth);
        }
        closure
    }
}

impl<'a> IntoIterator for &'a Closure {
    type Item = (&'a ObjectId, &'a u32);
    type IntoIter = btree_map::Iter<'a, ObjectId, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
