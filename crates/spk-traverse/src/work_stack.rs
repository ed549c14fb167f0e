//! Explicit-stack traversal.
//!
//! Each nested object, array and chunked property becomes a [`Task`] on a
//! heap-allocated stack instead of a native call. A task runs until it
//! either needs a nested task (which is pushed) or finishes (its outcome is
//! handed to the task below). Side effects on the [`TraversalContext`] happen
//! in exactly the order of the recursive strategy, so both produce the same
//! ids, closures and stores.

use std::slice;

use serde_json::{Map, Value};
use spk_store::ObjectStore;
use spk_types::ObjectId;
use tracing::trace;

use crate::config::TraverseConfig;
use crate::context::TraversalContext;
use crate::error::{TraverseError, TraverseResult};
use crate::frame::ObjectFrame;
use crate::plan::{
    plan_element, plan_property, BaseSource, ElementAction, Properties, PropertyAction,
};

/// Result of a finished task.
enum Outcome {
    Object(ObjectId, Map<String, Value>),
    Value(Value),
}

enum Step<'v> {
    Push(Task<'v>),
    Done(Outcome),
}

/// Property slot an object task is waiting to fill.
struct Pending {
    name: String,
    detach: bool,
}

enum Task<'v> {
    Object {
        frame: Option<ObjectFrame>,
        properties: Properties<'v>,
        pending: Option<Pending>,
    },
    Array {
        property: String,
        items: slice::Iter<'v, Value>,
        detach: bool,
        resolved: Vec<Value>,
    },
    Chunks {
        name: String,
        chunks: slice::Chunks<'v, Value>,
        references: Vec<Value>,
    },
}

impl<'v> Task<'v> {
    fn object(ctx: &mut TraversalContext, source: BaseSource<'v>) -> TraverseResult<Self> {
        Ok(Self::Object {
            frame: Some(ObjectFrame::open(ctx, source.speckle_type())?),
            properties: source.properties(),
            pending: None,
        })
    }

    fn array(ctx: &mut TraversalContext, property: String, items: &'v [Value], detach: bool) -> TraverseResult<Self> {
        ctx.enter()?;
        Ok(Self::Array {
            property,
            items: items.iter(),
            detach,
            resolved: Vec::with_capacity(items.len()),
        })
    }

    /// Receive the outcome of the task that was pushed on top of this one.
    fn accept(&mut self, ctx: &mut TraversalContext, outcome: Outcome) -> TraverseResult<()> {
        match self {
            Self::Object { frame, pending, .. } => {
                let Pending { name, detach } = pending.take().ok_or_else(|| {
                    TraverseError::Bookkeeping("object task received an unrequested outcome".into())
                })?;
                let frame = frame.as_mut().ok_or_else(|| {
                    TraverseError::Bookkeeping("object task received an outcome after finishing".into())
                })?;
                let value = match outcome {
                    Outcome::Object(id, _) if detach => ctx.detach_helper(id).to_value(),
                    Outcome::Object(_, body) => Value::Object(body),
                    Outcome::Value(value) => value,
                };
                frame.insert(name, value);
            }
            Self::Array { detach, resolved, .. } => {
                let value = match outcome {
                    Outcome::Object(id, _) if *detach => ctx.detach_helper(id).to_value(),
                    Outcome::Object(_, body) => Value::Object(body),
                    Outcome::Value(value) => value,
                };
                resolved.push(value);
            }
            Self::Chunks { references, .. } => match outcome {
                Outcome::Object(id, _) => references.push(ctx.detach_helper(id).to_value()),
                Outcome::Value(_) => {
                    return Err(TraverseError::Bookkeeping(
                        "chunk task received a non-object outcome".into(),
                    ))
                }
            },
        }
        Ok(())
    }

    /// Run until a nested task is needed or this task is complete.
    fn step<S: ObjectStore + ?Sized>(
        &mut self,
        ctx: &mut TraversalContext,
        store: &S,
        config: &TraverseConfig,
    ) -> TraverseResult<Step<'v>> {
        match self {
            Self::Object {
                frame,
                properties,
                pending,
            } => {
                let current = frame.as_mut().ok_or_else(|| {
                    TraverseError::Bookkeeping("object task stepped after finishing".into())
                })?;
                for (raw, value) in properties.by_ref() {
                    match plan_property(ctx, config, raw, value)? {
                        PropertyAction::Skip => {}
                        PropertyAction::Inline(name, value) => current.insert(name, value),
                        PropertyAction::Chunks { name, chunks } => {
                            *pending = Some(Pending {
                                name: name.clone(),
                                detach: false,
                            });
                            return Ok(Step::Push(Self::Chunks {
                                name,
                                references: Vec::with_capacity(chunks.len()),
                                chunks,
                            }));
                        }
                        PropertyAction::Array { name, detach, items } => {
                            let task = Self::array(ctx, name.clone(), items, detach)?;
                            *pending = Some(Pending { name, detach });
                            return Ok(Step::Push(task));
                        }
                        PropertyAction::Base { name, detach, source } => {
                            ctx.push_detach(detach);
                            let task = Self::object(ctx, source)?;
                            *pending = Some(Pending { name, detach });
                            return Ok(Step::Push(task));
                        }
                    }
                }
                let finished = frame.take().ok_or_else(|| {
                    TraverseError::Bookkeeping("object task finished twice".into())
                })?;
                let (id, body) = finished.finish(ctx, store, config)?;
                Ok(Step::Done(Outcome::Object(id, body)))
            }
            Self::Array {
                property,
                items,
                detach,
                resolved,
            } => {
                for item in items.by_ref() {
                    match plan_element(ctx, property, item)? {
                        ElementAction::Inline(value) => resolved.push(value),
                        ElementAction::Array(nested) => {
                            return Ok(Step::Push(Self::array(ctx, property.clone(), nested, *detach)?));
                        }
                        ElementAction::Base(source) => {
                            ctx.push_detach(*detach);
                            return Ok(Step::Push(Self::object(ctx, source)?));
                        }
                    }
                }
                ctx.leave();
                Ok(Step::Done(Outcome::Value(Value::Array(std::mem::take(resolved)))))
            }
            Self::Chunks {
                name,
                chunks,
                references,
            } => match chunks.next() {
                Some(chunk) => {
                    ctx.push_detach(true);
                    Ok(Step::Push(Self::object(ctx, BaseSource::Chunk(chunk))?))
                }
                None => {
                    trace!(property = %name, chunks = references.len(), "chunked property");
                    Ok(Step::Done(Outcome::Value(Value::Array(std::mem::take(references)))))
                }
            },
        }
    }
}

/// Traverse `root` without native recursion.
pub(crate) fn run<S: ObjectStore + ?Sized>(
    ctx: &mut TraversalContext,
    store: &S,
    config: &TraverseConfig,
    root: BaseSource<'_>,
) -> TraverseResult<(ObjectId, Map<String, Value>)> {
    let mut stack = vec![Task::object(ctx, root)?];
    let mut carried: Option<Outcome> = None;

    loop {
        let task = stack.last_mut().ok_or_else(|| {
            TraverseError::Bookkeeping("work stack drained before the root finished".into())
        })?;
        if let Some(outcome) = carried.take() {
            task.accept(ctx, outcome)?;
        }
        match task.step(ctx, store, config)? {
            Step::Push(child) => stack.push(child),
            Step::Done(outcome) => {
                stack.pop();
                if stack.is_empty() {
                    return match outcome {
                        Outcome::Object(id, body) => Ok((id, body)),
                        Outcome::Value(_) => Err(TraverseError::Bookkeeping(
                            "root task did not produce an object".into(),
                        )),
                    };
                }
                carried = Some(outcome);
            }
        }
    }
}
