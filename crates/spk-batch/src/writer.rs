use std::path::{Path, PathBuf};

use spk_store::{ObjectStore, TraversedObject};
use spk_types::ObjectId;
use tracing::debug;

use crate::error::{BatchError, BatchResult};

/// Default upper bound on the byte length of one batch.
pub const DEFAULT_MAX_BATCH_BYTES: usize = 1_000_000;

/// A JSON array of complete traversed objects: `[obj,obj,...]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    text: String,
    ids: Vec<ObjectId>,
}

impl Batch {
    /// The batch text, brackets and separators included.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Ids of the objects in the batch, in batch order.
    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn len_bytes(&self) -> usize {
        self.text.len()
    }

    pub fn object_count(&self) -> usize {
        self.ids.len()
    }
}

/// Groups traversed objects into size-bounded batches.
///
/// Objects are appended greedily in store order. A batch is closed when the
/// next object would push it over the limit; an object that exceeds the
/// limit on its own gets a batch of its own. Objects are never split and no
/// batch is empty.
#[derive(Clone, Copy, Debug)]
pub struct BatchWriter {
    max_batch_bytes: usize,
}

impl BatchWriter {
    pub fn new(max_batch_bytes: usize) -> BatchResult<Self> {
        if max_batch_bytes == 0 {
            return Err(BatchError::InvalidLimit(max_batch_bytes));
        }
        Ok(Self { max_batch_bytes })
    }

    pub fn max_batch_bytes(&self) -> usize {
        self.max_batch_bytes
    }

    /// Batch every object of `store` in insertion order.
    pub fn batch<S: ObjectStore + ?Sized>(&self, store: &S) -> BatchResult<Vec<Batch>> {
        let objects = store.objects()?;
        self.batch_objects(&objects)
    }

    /// Batch the given objects in order.
    pub fn batch_objects<'a>(
        &self,
        objects: impl IntoIterator<Item = &'a TraversedObject>,
    ) -> BatchResult<Vec<Batch>> {
        let mut batches = Vec::new();
        let mut open = OpenBatch::default();

        for object in objects {
            let json = object.to_json()?;
            if !open.is_empty() && open.len_with(&json) > self.max_batch_bytes {
                batches.push(open.close());
            }
            open.push(object.id(), &json);
        }
        if !open.is_empty() {
            batches.push(open.close());
        }

        debug!(
            batches = batches.len(),
            objects = batches.iter().map(Batch::object_count).sum::<usize>(),
            max_bytes = self.max_batch_bytes,
            "batched objects"
        );
        Ok(batches)
    }
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self {
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
        }
    }
}

/// A batch still accepting objects. `text` holds the opening bracket and
/// the objects so far; the closing bracket is added on close.
struct OpenBatch {
    text: String,
    ids: Vec<ObjectId>,
}

impl Default for OpenBatch {
    fn default() -> Self {
        Self {
            text: String::from("["),
            ids: Vec::new(),
        }
    }
}

impl OpenBatch {
    fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Closed length of this batch if `json` were appended.
    fn len_with(&self, json: &str) -> usize {
        let separator = usize::from(!self.is_empty());
        self.text.len() + separator + json.len() + 1
    }

    fn push(&mut self, id: ObjectId, json: &str) {
        if !self.is_empty() {
            self.text.push(',');
        }
        self.text.push_str(json);
        self.ids.push(id);
    }

    fn close(&mut self) -> Batch {
        let OpenBatch { mut text, ids } = std::mem::take(self);
        text.push(']');
        Batch { text, ids }
    }
}

/// Write each batch to `dir` as `batch-NNNN.json`, creating the directory
/// if needed. Returns the written paths in batch order.
pub fn write_batches(dir: &Path, batches: &[Batch]) -> BatchResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(batches.len());
    for (index, batch) in batches.iter().enumerate() {
        let path = dir.join(format!("batch-{index:04}.json"));
        std::fs::write(&path, batch.text())?;
        paths.push(path);
    }
    debug!(dir = %dir.display(), files = paths.len(), "wrote batches");
    Ok(paths)
}
