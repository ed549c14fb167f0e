use std::collections::HashSet;

use spk_types::ObjectId;

use crate::error::StoreResult;
use crate::object::TraversedObject;

/// A reference whose target is neither in the store nor among the ids the
/// caller declared as already uploaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DanglingReference {
    /// Object containing the reference.
    pub owner: ObjectId,
    /// Unresolved target.
    pub target: ObjectId,
}

/// Content-addressed store of traversed objects.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same id always maps to the same
///   content.
/// - `write` recomputes the content hash and rejects mismatching ids.
/// - `ids` returns insertion order.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<TraversedObject>>;

    /// Write an object and return its ID.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &TraversedObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// All ids in insertion order.
    fn ids(&self) -> StoreResult<Vec<ObjectId>>;

    /// Read multiple objects in a batch.
    fn read_batch(&self, ids: &[ObjectId]) -> StoreResult<Vec<Option<TraversedObject>>> {
        ids.iter().map(|id| self.read(id)).collect()
    }

    /// Write multiple objects in a batch and return their IDs.
    fn write_batch(&self, objects: &[TraversedObject]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.write(obj)).collect()
    }

    /// All objects in insertion order.
    fn objects(&self) -> StoreResult<Vec<TraversedObject>> {
        Ok(self
            .read_batch(&self.ids()?)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// References that resolve neither inside the store nor to `known`.
    ///
    /// `known` holds ids uploaded by earlier calls (typically the targets of
    /// reused object references).
    fn dangling_references(&self, known: &HashSet<ObjectId>) -> StoreResult<Vec<DanglingReference>> {
        let mut dangling = Vec::new();
        for object in self.objects()? {
            for target in object.references() {
                if !known.contains(&target) && !self.exists(&target)? {
                    dangling.push(DanglingReference {
                        owner: object.id(),
                        target,
                    });
                }
            }
        }
        Ok(dangling)
    }
}
