use serde_json::Value;
use spk_store::TraversedObject;

use crate::error::{BatchError, BatchResult};

/// Split a batch back into its objects, checking every object's id against
/// its content.
pub fn parse_batch(text: &str) -> BatchResult<Vec<TraversedObject>> {
    let value: Value = serde_json::from_str(text).map_err(|e| BatchError::Serialization(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(BatchError::Malformed("batch is not a JSON array".into()));
    };
    if items.is_empty() {
        return Err(BatchError::Malformed("batch is empty".into()));
    }

    items
        .into_iter()
        .map(|item| {
            let object = TraversedObject::from_value(item)?;
            let computed = object.compute_id()?;
            if computed != object.id() {
                return Err(BatchError::HashMismatch {
                    id: object.id(),
                    computed,
                });
            }
            Ok(object)
        })
        .collect()
}
