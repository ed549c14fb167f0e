use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use spk_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::TraversedObject;
use crate::traits::ObjectStore;

#[derive(Default)]
struct Inner {
    objects: HashMap<ObjectId, TraversedObject>,
    order: Vec<ObjectId>,
}

/// Object store keyed by id, kept entirely in memory.
///
/// Holds one serialize call's output (or several, merged). All objects are
/// held behind a `RwLock`; objects are cloned on read/write. Insertion order
/// is tracked so batches come out children first.
pub struct InMemoryObjectStore {
    inner: RwLock<Inner>,
}

impl InMemoryObjectStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").order.is_empty()
    }

    /// Drop every object.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.objects.clear();
        inner.order.clear();
    }

    /// Every stored id in ascending order, regardless of insertion order.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let inner = self.inner.read().expect("lock poisoned");
        let mut ids = inner.order.clone();
        ids.sort();
        ids
    }

    /// Copy every object of `other` that is not yet present, keeping
    /// `other`'s insertion order. Returns the number of objects added.
    pub fn merge_from(&self, other: &InMemoryObjectStore) -> usize {
        let incoming: Vec<TraversedObject> = {
            let theirs = other.inner.read().expect("lock poisoned");
            theirs
                .order
                .iter()
                .filter_map(|id| theirs.objects.get(id).cloned())
                .collect()
        };
        let mut inner = self.inner.write().expect("lock poisoned");
        let mut added = 0;
        for object in incoming {
            let id = object.id();
            if !inner.objects.contains_key(&id) {
                inner.order.push(id);
                inner.objects.insert(id, object);
                added += 1;
            }
        }
        debug!(added, total = inner.order.len(), "merged object store");
        added
    }

    /// Every object's JSON text keyed by id.
    pub fn canonical_texts(&self) -> StoreResult<BTreeMap<ObjectId, String>> {
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .objects
            .iter()
            .map(|(id, object)| Ok((*id, object.to_json()?)))
            .collect()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<TraversedObject>> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.objects.get(id).cloned())
    }

    fn write(&self, object: &TraversedObject) -> StoreResult<ObjectId> {
        let id = object.id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let mut inner = self.inner.write().expect("lock poisoned");
        // Same id, same content: a second write is a no-op.
        if inner.objects.contains_key(&id) {
            return Ok(id);
        }
        let computed = object.compute_id()?;
        if computed != id {
            return Err(StoreError::HashMismatch { id, computed });
        }
        inner.order.push(id);
        inner.objects.insert(id, object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.objects.contains_key(id))
    }

    fn ids(&self) -> StoreResult<Vec<ObjectId>> {
        Ok(self.inner.read().expect("lock poisoned").order.clone())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}
