use std::collections::BTreeMap;

use serde_json::Value;
use spk_batch::{Batch, BatchWriter};
use spk_store::{InMemoryObjectStore, ObjectStore, TraversedObject};
use spk_traverse::Traverser;
use spk_types::{ObjectId, ObjectReference};
use tracing::info;

use crate::config::SerializerConfig;
use crate::error::{SdkError, SdkResult};

/// Serializes base object graphs into a content-addressed store.
///
/// Objects accumulate across calls. Each call traverses into a scratch store
/// that is merged only when the whole graph succeeded, so a failed call
/// leaves the accumulated store as it was.
pub struct Serializer {
    config: SerializerConfig,
    store: InMemoryObjectStore,
    object_references: BTreeMap<String, ObjectReference>,
}

impl Serializer {
    pub fn new(config: SerializerConfig) -> SdkResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: InMemoryObjectStore::new(),
            object_references: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    // ---- Serialization ----

    /// Traverse `root`, store it and every detached object, and return the
    /// root id.
    pub fn serialize(&mut self, root: &Value) -> SdkResult<ObjectId> {
        let scratch = InMemoryObjectStore::new();
        let mut traverser = Traverser::new(&scratch, self.config.traverse.clone());
        let (id, _) = traverser.traverse(root)?;
        let references = traverser.into_object_references();

        let added = self.store.merge_from(&scratch);
        let handles = references.len();
        self.object_references.extend(references);
        info!(
            root = %id.short_hex(),
            objects = scratch.len(),
            added,
            handles,
            "serialized object graph"
        );
        Ok(id)
    }

    /// Serialize `root` and return its stored form.
    pub fn serialize_object(&mut self, root: &Value) -> SdkResult<TraversedObject> {
        let id = self.serialize(root)?;
        self.read_object(&id)
    }

    // ---- Store access ----

    pub fn object_store(&self) -> &InMemoryObjectStore {
        &self.store
    }

    pub fn read_object(&self, id: &ObjectId) -> SdkResult<TraversedObject> {
        self.store.read(id)?.ok_or(SdkError::ObjectNotFound(*id))
    }

    /// JSON text of every stored object, keyed by id.
    pub fn canonical_objects(&self) -> SdkResult<BTreeMap<ObjectId, String>> {
        Ok(self.store.canonical_texts()?)
    }

    /// Reuse handles for every object that carried an `applicationId`,
    /// across all successful calls. Later calls win on conflicts.
    pub fn object_references(&self) -> &BTreeMap<String, ObjectReference> {
        &self.object_references
    }

    pub fn object_reference(&self, application_id: &str) -> Option<&ObjectReference> {
        self.object_references.get(application_id)
    }

    // ---- Batching ----

    /// Cut the accumulated store into batches of at most `max_bytes`.
    pub fn batch_objects(&self, max_bytes: usize) -> SdkResult<Vec<Batch>> {
        Ok(BatchWriter::new(max_bytes)?.batch(&self.store)?)
    }

    /// [`Self::batch_objects`] with the configured limit.
    pub fn batches(&self) -> SdkResult<Vec<Batch>> {
        self.batch_objects(self.config.max_batch_bytes)
    }

    /// Drop every accumulated object and reuse handle.
    pub fn reset(&mut self) {
        self.store.clear();
        self.object_references.clear();
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self {
            config: SerializerConfig::default(),
            store: InMemoryObjectStore::new(),
            object_references: BTreeMap::new(),
        }
    }
}
