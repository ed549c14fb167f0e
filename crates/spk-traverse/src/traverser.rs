use std::collections::BTreeMap;

use serde_json::{Map, Value};
use spk_store::ObjectStore;
use spk_types::{ObjectId, ObjectReference};
use tracing::debug;

use crate::config::{TraversalStrategy, TraverseConfig};
use crate::context::TraversalContext;
use crate::error::{TraverseError, TraverseResult};
use crate::plan::{classify, kind_name, ValueKind};
use crate::recursive::Recursive;
use crate::work_stack;

/// Walks a base object graph and fills an [`ObjectStore`] with the root and
/// every detached object.
///
/// A traverser owns the [`TraversalContext`] of one serialize call. Frames
/// left open by a failed call are dropped when the next call starts.
pub struct Traverser<'s, S: ObjectStore + ?Sized> {
    ctx: TraversalContext,
    store: &'s S,
    config: TraverseConfig,
}

impl<'s, S: ObjectStore + ?Sized> Traverser<'s, S> {
    pub fn new(store: &'s S, config: TraverseConfig) -> Self {
        Self {
            ctx: TraversalContext::new(config.max_depth),
            store,
            config,
        }
    }

    pub fn config(&self) -> &TraverseConfig {
        &self.config
    }

    /// Traverse `root` and return its id and traversed form.
    ///
    /// The root is always stored. On error the store may hold part of the
    /// graph and must be discarded.
    pub fn traverse(&mut self, root: &Value) -> TraverseResult<(ObjectId, Map<String, Value>)> {
        self.config.validate()?;
        self.ctx.reset_frames();
        let source = match classify("<root>", root)? {
            ValueKind::Base(source) => source,
            ValueKind::Reference(reference) => {
                return Err(TraverseError::NotABaseObject(format!(
                    "root is a reference to {}",
                    reference.referenced_id
                )))
            }
            _ => {
                return Err(TraverseError::NotABaseObject(format!(
                    "{} without a string speckle_type",
                    kind_name(root)
                )))
            }
        };

        self.ctx.push_detach(true);
        let (id, body) = match self.config.strategy {
            TraversalStrategy::Recursive => Recursive {
                ctx: &mut self.ctx,
                store: self.store,
                config: &self.config,
            }
            .traverse_base(source)?,
            TraversalStrategy::WorkStack => work_stack::run(&mut self.ctx, self.store, &self.config, source)?,
        };
        self.ctx.ensure_settled()?;

        debug!(
            root = %id.short_hex(),
            strategy = ?self.config.strategy,
            references = self.ctx.object_references().len(),
            "traversed object graph"
        );
        Ok((id, body))
    }

    /// Reuse handles recorded for objects carrying an `applicationId`.
    pub fn object_references(&self) -> &BTreeMap<String, ObjectReference> {
        self.ctx.object_references()
    }

    pub fn into_object_references(self) -> BTreeMap<String, ObjectReference> {
        self.ctx.into_object_references()
    }
}
