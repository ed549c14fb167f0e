//! Per-property and per-element decisions shared by both traversal
//! strategies.
//!
//! Planning performs every side effect that does not need a nested frame
//! (copying primitives, threading pre-existing references through the
//! detach helper) and describes the rest as an action for the strategy to
//! carry out.

use serde_json::map;
use serde_json::{Map, Value};
use spk_types::base::{DATA_CHUNK_FIELD, DATA_CHUNK_TYPE, SPECKLE_TYPE, TOTAL_CHILDREN_COUNT};
use spk_types::{ObjectReference, PropertyDirective};

use crate::chunk::split_chunks;
use crate::config::TraverseConfig;
use crate::context::TraversalContext;
use crate::error::{TraverseError, TraverseResult};

/// An object about to be traversed.
#[derive(Clone, Copy, Debug)]
pub(crate) enum BaseSource<'v> {
    /// A base object from the input graph.
    Map {
        map: &'v Map<String, Value>,
        speckle_type: &'v str,
    },
    /// A data chunk holding one slice of a chunked array.
    Chunk(&'v [Value]),
}

impl<'v> BaseSource<'v> {
    pub(crate) fn speckle_type(&self) -> &'v str {
        match self {
            Self::Map { speckle_type, .. } => speckle_type,
            Self::Chunk(_) => DATA_CHUNK_TYPE,
        }
    }

    pub(crate) fn properties(&self) -> Properties<'v> {
        match self {
            Self::Map { map, .. } => Properties::Map(map.iter()),
            Self::Chunk(items) => Properties::Chunk(Some(items)),
        }
    }
}

/// Property iterator over a [`BaseSource`].
pub(crate) enum Properties<'v> {
    Map(map::Iter<'v>),
    Chunk(Option<&'v [Value]>),
}

pub(crate) enum PropValue<'v> {
    Value(&'v Value),
    Items(&'v [Value]),
}

impl<'v> Iterator for Properties<'v> {
    type Item = (&'v str, PropValue<'v>);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Map(iter) => iter.next().map(|(k, v)| (k.as_str(), PropValue::Value(v))),
            Self::Chunk(slot) => slot.take().map(|items| (DATA_CHUNK_FIELD, PropValue::Items(items))),
        }
    }
}

/// What a JSON value is, as far as traversal is concerned.
#[derive(Debug)]
pub(crate) enum ValueKind<'v> {
    Primitive,
    Array(&'v [Value]),
    Reference(ObjectReference),
    Base(BaseSource<'v>),
    /// A map without `speckle_type`: copied through untouched.
    Opaque,
}

pub(crate) fn classify<'v>(property: &str, value: &'v Value) -> TraverseResult<ValueKind<'v>> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(ValueKind::Primitive),
        Value::Array(items) => Ok(ValueKind::Array(items)),
        Value::Object(map) => match map.get(SPECKLE_TYPE) {
            None | Some(Value::Null) => Ok(ValueKind::Opaque),
            Some(Value::String(speckle_type)) => {
                let reference = ObjectReference::from_map(map).map_err(|source| {
                    TraverseError::MalformedReference {
                        property: property.to_string(),
                        source,
                    }
                })?;
                Ok(match reference {
                    Some(reference) => ValueKind::Reference(reference),
                    None => ValueKind::Base(BaseSource::Map { map, speckle_type }),
                })
            }
            Some(other) => Err(TraverseError::UnsupportedValue {
                property: format!("{property}.{SPECKLE_TYPE}"),
                kind: kind_name(other).to_string(),
            }),
        },
    }
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decision for one property of an object frame.
pub(crate) enum PropertyAction<'v> {
    Skip,
    /// Insert the value as is.
    Inline(String, Value),
    /// Chunk the array and detach every chunk.
    Chunks {
        name: String,
        chunks: std::slice::Chunks<'v, Value>,
    },
    /// Resolve the array element by element.
    Array {
        name: String,
        detach: bool,
        items: &'v [Value],
    },
    /// Traverse a nested base object; reference it if `detach`.
    Base {
        name: String,
        detach: bool,
        source: BaseSource<'v>,
    },
}

pub(crate) fn plan_property<'v>(
    ctx: &mut TraversalContext,
    config: &TraverseConfig,
    raw: &'v str,
    value: PropValue<'v>,
) -> TraverseResult<PropertyAction<'v>> {
    if raw == SPECKLE_TYPE {
        return Ok(PropertyAction::Skip);
    }
    let value = match value {
        PropValue::Items(items) => {
            return Ok(PropertyAction::Array {
                name: raw.to_string(),
                detach: false,
                items,
            })
        }
        PropValue::Value(value) => value,
    };
    if value.is_null() {
        return Ok(PropertyAction::Skip);
    }
    let Some(directive) = PropertyDirective::parse(raw)? else {
        return Ok(PropertyAction::Skip);
    };
    let PropertyDirective { name, detach, chunk } = directive;
    // The emitted count replaces any input value of the same name.
    if config.emit_total_children_count && name == TOTAL_CHILDREN_COUNT {
        return Ok(PropertyAction::Skip);
    }

    Ok(match classify(&name, value)? {
        ValueKind::Primitive | ValueKind::Opaque => PropertyAction::Inline(name, value.clone()),
        ValueKind::Array(items) => match chunk {
            Some(size) => {
                let size = size.resolve(config.default_chunk_size) as usize;
                PropertyAction::Chunks {
                    name,
                    chunks: split_chunks(items, size),
                }
            }
            None => PropertyAction::Array { name, detach, items },
        },
        ValueKind::Reference(reference) => {
            PropertyAction::Inline(name, ctx.detach_existing(&reference).to_value())
        }
        ValueKind::Base(source) => PropertyAction::Base { name, detach, source },
    })
}

/// Decision for one element of an array being resolved.
pub(crate) enum ElementAction<'v> {
    Inline(Value),
    Array(&'v [Value]),
    Base(BaseSource<'v>),
}

pub(crate) fn plan_element<'v>(
    ctx: &mut TraversalContext,
    property: &str,
    value: &'v Value,
) -> TraverseResult<ElementAction<'v>> {
    Ok(match classify(property, value)? {
        ValueKind::Primitive | ValueKind::Opaque => ElementAction::Inline(value.clone()),
        ValueKind::Array(items) => ElementAction::Array(items),
        ValueKind::Reference(reference) => ElementAction::Inline(ctx.detach_existing(&reference).to_value()),
        ValueKind::Base(source) => ElementAction::Base(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_kinds() {
        assert!(matches!(classify("p", &json!(1)).unwrap(), ValueKind::Primitive));
        assert!(matches!(classify("p", &json!([1])).unwrap(), ValueKind::Array(_)));
        assert!(matches!(classify("p", &json!({ "a": 1 })).unwrap(), ValueKind::Opaque));
        assert!(matches!(
            classify("p", &json!({ "speckle_type": null })).unwrap(),
            ValueKind::Opaque
        ));
        assert!(matches!(
            classify("p", &json!({ "speckle_type": "Point" })).unwrap(),
            ValueKind::Base(_)
        ));
    }

    #[test]
    fn classify_reference() {
        let value = json!({ "speckle_type": "reference", "referencedId": "00112233445566778899aabbccddeeff" });
        assert!(matches!(classify("p", &value).unwrap(), ValueKind::Reference(_)));
    }

    #[test]
    fn non_string_speckle_type_is_unsupported() {
        let err = classify("child", &json!({ "speckle_type": 5 })).unwrap_err();
        match err {
            TraverseError::UnsupportedValue { property, kind } => {
                assert_eq!(property, "child.speckle_type");
                assert_eq!(kind, "number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_reference_names_property() {
        let err = classify("child", &json!({ "speckle_type": "reference" })).unwrap_err();
        assert!(matches!(err, TraverseError::MalformedReference { ref property, .. } if property == "child"));
    }

    #[test]
    fn plan_strips_markers_on_primitives() {
        let mut ctx = TraversalContext::new(8);
        let value = json!(3);
        let action = plan_property(&mut ctx, &TraverseConfig::default(), "@count", PropValue::Value(&value)).unwrap();
        assert!(matches!(action, PropertyAction::Inline(ref name, _) if name == "count"));
    }

    #[test]
    fn plan_skips_reserved_and_null() {
        let mut ctx = TraversalContext::new(8);
        let config = TraverseConfig::default();
        let one = json!(1);
        let null = Value::Null;
        for (raw, value) in [("id", &one), ("_hidden", &one), ("speckle_type", &one), ("x", &null)] {
            let action = plan_property(&mut ctx, &config, raw, PropValue::Value(value)).unwrap();
            assert!(matches!(action, PropertyAction::Skip), "{raw} should be skipped");
        }
    }

    #[test]
    fn input_children_count_dropped_only_when_emitting() {
        let mut ctx = TraversalContext::new(8);
        let value = json!(99);
        let emitting = TraverseConfig {
            emit_total_children_count: true,
            ..Default::default()
        };
        for raw in ["totalChildrenCount", "@totalChildrenCount"] {
            let action = plan_property(&mut ctx, &emitting, raw, PropValue::Value(&value)).unwrap();
            assert!(matches!(action, PropertyAction::Skip), "{raw} should be skipped");
        }

        let action =
            plan_property(&mut ctx, &TraverseConfig::default(), "totalChildrenCount", PropValue::Value(&value))
                .unwrap();
        assert!(matches!(action, PropertyAction::Inline(ref name, _) if name == "totalChildrenCount"));
    }

    #[test]
    fn chunk_marker_on_object_detaches_it() {
        let mut ctx = TraversalContext::new(8);
        let value = json!({ "speckle_type": "Mesh" });
        let action =
            plan_property(&mut ctx, &TraverseConfig::default(), "@(10)mesh", PropValue::Value(&value)).unwrap();
        assert!(matches!(action, PropertyAction::Base { detach: true, ref name, .. } if name == "mesh"));
    }

    #[test]
    fn default_chunk_size_comes_from_config() {
        let mut ctx = TraversalContext::new(8);
        let config = TraverseConfig {
            default_chunk_size: 2,
            ..Default::default()
        };
        let value = json!([1, 2, 3, 4, 5]);
        match plan_property(&mut ctx, &config, "@()values", PropValue::Value(&value)).unwrap() {
            PropertyAction::Chunks { name, chunks } => {
                assert_eq!(name, "values");
                assert_eq!(chunks.count(), 3);
            }
            _ => panic!("expected chunks"),
        }
    }

    #[test]
    fn chunk_source_has_single_data_property() {
        let items = [json!(1), json!(2)];
        let source = BaseSource::Chunk(&items);
        assert_eq!(source.speckle_type(), DATA_CHUNK_TYPE);
        let props: Vec<_> = source.properties().map(|(name, _)| name).collect();
        assert_eq!(props, vec![DATA_CHUNK_FIELD]);
    }
}
