use serde_json::{Map, Value};
use spk_crypto::{ContentHasher, LineageToken};
use spk_store::{ObjectStore, TraversedObject};
use spk_types::base::{APPLICATION_ID, CLOSURE, ID, SPECKLE_TYPE, TOTAL_CHILDREN_COUNT};
use spk_types::{ObjectId, ObjectReference};
use tracing::debug;

use crate::config::TraverseConfig;
use crate::context::TraversalContext;
use crate::error::TraverseResult;

/// An object under construction.
pub(crate) struct ObjectFrame {
    token: LineageToken,
    detached: bool,
    out: Map<String, Value>,
}

impl ObjectFrame {
    /// Open a frame; the caller must have pushed this frame's detach flag.
    pub(crate) fn open(ctx: &mut TraversalContext, speckle_type: &str) -> TraverseResult<Self> {
        let (token, detached) = ctx.open_frame()?;
        let mut out = Map::new();
        out.insert(SPECKLE_TYPE.into(), Value::String(speckle_type.to_string()));
        Ok(Self {
            token,
            detached,
            out,
        })
    }

    pub(crate) fn insert(&mut self, name: String, value: Value) {
        self.out.insert(name, value);
    }

    /// Close the frame: closure, id, reuse handle, and storage if detached.
    pub(crate) fn finish<S: ObjectStore + ?Sized>(
        self,
        ctx: &mut TraversalContext,
        store: &S,
        config: &TraverseConfig,
    ) -> TraverseResult<(ObjectId, Map<String, Value>)> {
        let Self {
            token,
            detached,
            mut out,
        } = self;

        let closure = ctx.close_frame(token)?;
        if config.emit_total_children_count {
            out.insert(TOTAL_CHILDREN_COUNT.into(), Value::from(closure.len()));
        }

        let id = ContentHasher::OBJECT.hash_object(&out)?;
        out.insert(ID.into(), Value::String(id.to_hex()));
        if !closure.is_empty() {
            out.insert(CLOSURE.into(), closure.to_value());
        }

        if let Some(app_id) = out.get(APPLICATION_ID).and_then(Value::as_str) {
            let app_id = app_id.to_string();
            let handle = ObjectReference::new(id, Some(app_id.clone()), closure.clone());
            ctx.record_object_reference(app_id, handle);
        }

        if detached {
            store.write(&TraversedObject::from_parts(id, closure, out.clone()))?;
            debug!(id = %id.short_hex(), speckle_type = ?out.get(SPECKLE_TYPE), "stored object");
        }
        Ok((id, out))
    }
}
