//! Recursive traversal: one native call per nested object or array.

use serde_json::{Map, Value};
use spk_store::ObjectStore;
use spk_types::ObjectId;
use tracing::trace;

use crate::config::TraverseConfig;
use crate::context::TraversalContext;
use crate::error::TraverseResult;
use crate::frame::ObjectFrame;
use crate::plan::{plan_element, plan_property, BaseSource, ElementAction, PropertyAction};

pub(crate) struct Recursive<'a, S: ObjectStore + ?Sized> {
    pub(crate) ctx: &'a mut TraversalContext,
    pub(crate) store: &'a S,
    pub(crate) config: &'a TraverseConfig,
}

impl<S: ObjectStore + ?Sized> Recursive<'_, S> {
    pub(crate) fn traverse_base(&mut self, source: BaseSource<'_>) -> TraverseResult<(ObjectId, Map<String, Value>)> {
        let mut frame = ObjectFrame::open(self.ctx, source.speckle_type())?;

        for (raw, value) in source.properties() {
            match plan_property(self.ctx, self.config, raw, value)? {
                PropertyAction::Skip => {}
                PropertyAction::Inline(name, value) => frame.insert(name, value),
                PropertyAction::Chunks { name, chunks } => {
                    let mut references = Vec::with_capacity(chunks.len());
                    for chunk in chunks {
                        self.ctx.push_detach(true);
                        let (id, _) = self.traverse_base(BaseSource::Chunk(chunk))?;
                        references.push(self.ctx.detach_helper(id).to_value());
                    }
                    trace!(property = %name, chunks = references.len(), "chunked property");
                    frame.insert(name, Value::Array(references));
                }
                PropertyAction::Array { name, detach, items } => {
                    let resolved = self.resolve_array(&name, items, detach)?;
                    frame.insert(name, resolved);
                }
                PropertyAction::Base { name, detach, source } => {
                    self.ctx.push_detach(detach);
                    let (id, body) = self.traverse_base(source)?;
                    let value = if detach {
                        self.ctx.detach_helper(id).to_value()
                    } else {
                        Value::Object(body)
                    };
                    frame.insert(name, value);
                }
            }
        }

        frame.finish(self.ctx, self.store, self.config)
    }

    /// Resolve every element of an array. Base elements of a detached array
    /// become references; everything else is inlined.
    fn resolve_array(&mut self, property: &str, items: &[Value], detach: bool) -> TraverseResult<Value> {
        self.ctx.enter()?;
        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            let value = match plan_element(self.ctx, property, item)? {
                ElementAction::Inline(value) => value,
                ElementAction::Array(nested) => self.resolve_array(property, nested, detach)?,
                ElementAction::Base(source) => {
                    self.ctx.push_detach(detach);
                    let (id, body) = self.traverse_base(source)?;
                    if detach {
                        self.ctx.detach_helper(id).to_value()
                    } else {
                        Value::Object(body)
                    }
                }
            };
            resolved.push(value);
        }
        self.ctx.leave();
        Ok(Value::Array(resolved))
    }
}
