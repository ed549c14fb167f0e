use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::base::{APPLICATION_ID, CLOSURE, REFERENCED_ID, REFERENCE_TYPE, SPECKLE_TYPE};
use crate::closure::Closure;
use crate::error::TypeError;
use crate::object::ObjectId;

/// Stub that replaces a detached value at its point of use.
///
/// References are never stored on their own; they are always inlined in the
/// parent that detached the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    pub referenced_id: ObjectId,
}

impl Reference {
    pub fn new(referenced_id: ObjectId) -> Self {
        Self { referenced_id }
    }

    /// `{ "referencedId": <hex>, "speckle_type": "reference" }`
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(REFERENCED_ID.into(), Value::String(self.referenced_id.to_hex()));
        map.insert(SPECKLE_TYPE.into(), Value::String(REFERENCE_TYPE.into()));
        Value::Object(map)
    }
}

impl From<Reference> for Value {
    fn from(reference: Reference) -> Self {
        reference.to_value()
    }
}

/// Reusable handle to an object sent by an earlier serialize call.
///
/// Recorded for every traversed object carrying an `applicationId`. Placing
/// the handle's [`to_value`](Self::to_value) form in a later graph makes the
/// traverser reference the existing object instead of serializing it again;
/// the handle's closure tells the new ancestors which grandchildren sit below
/// it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    #[serde(rename = "referencedId")]
    pub referenced_id: ObjectId,
    #[serde(rename = "applicationId", default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(rename = "__closure", default, skip_serializing_if = "Closure::is_empty")]
    pub closure: Closure,
}

impl ObjectReference {
    pub fn new(referenced_id: ObjectId, application_id: Option<String>, closure: Closure) -> Self {
        Self {
            referenced_id,
            application_id,
            closure,
        }
    }

    /// JSON form accepted by the traverser as a pre-existing reference.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(SPECKLE_TYPE.into(), Value::String(REFERENCE_TYPE.into()));
        map.insert(REFERENCED_ID.into(), Value::String(self.referenced_id.to_hex()));
        if let Some(app_id) = &self.application_id {
            map.insert(APPLICATION_ID.into(), Value::String(app_id.clone()));
        }
        if !self.closure.is_empty() {
            map.insert(CLOSURE.into(), self.closure.to_value());
        }
        Value::Object(map)
    }

    /// Recognize a reference-typed map.
    ///
    /// Returns `Ok(None)` when the map is not typed `"reference"`, and an
    /// error when it is but lacks a valid `referencedId` or closure.
    pub fn from_map(map: &Map<String, Value>) -> Result<Option<Self>, TypeError> {
        if map.get(SPECKLE_TYPE).and_then(Value::as_str) != Some(REFERENCE_TYPE) {
            return Ok(None);
        }
        let referenced_id = match map.get(REFERENCED_ID) {
            Some(Value::String(hex)) => ObjectId::from_hex(hex)?,
            Some(other) => {
                return Err(TypeError::MalformedReference(format!(
                    "referencedId must be a string, got {other}"
                )))
            }
            None => return Err(TypeError::MalformedReference("missing referencedId".into())),
        };
        let closure = match map.get(CLOSURE) {
            Some(Value::Null) | None => Closure::new(),
            Some(value) => Closure::from_value(value)?,
        };
        let application_id = map
            .get(APPLICATION_ID)
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Some(Self::new(referenced_id, application_id, closure)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::OBJECT_ID_LEN;
    use serde_json::json;

    fn id(n: u8) -> ObjectId {
        ObjectId::from_hash([n; OBJECT_ID_LEN])
    }

    #[test]
    fn reference_shape() {
        let value = Reference::new(id(1)).to_value();
        assert_eq!(
            value,
            json!({ "referencedId": id(1).to_hex(), "speckle_type": "reference" })
        );
    }

    #[test]
    fn object_reference_from_value_form() {
        let closure: Closure = [(id(2), 1), (id(3), 2)].into_iter().collect();
        let reference = ObjectReference::new(id(1), Some("app-1".into()), closure);
        let value = reference.to_value();
        let parsed = ObjectReference::from_map(value.as_object().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(parsed, reference);
    }

    #[test]
    fn plain_reference_stub_is_recognized() {
        let value = Reference::new(id(4)).to_value();
        let parsed = ObjectReference::from_map(value.as_object().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(parsed.referenced_id, id(4));
        assert!(parsed.closure.is_empty());
        assert!(parsed.application_id.is_none());
    }

    #[test]
    fn non_reference_map_is_none() {
        let value = json!({ "speckle_type": "Point", "x": 1 });
        assert!(ObjectReference::from_map(value.as_object().unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_referenced_id_is_error() {
        let value = json!({ "speckle_type": "reference" });
        let err = ObjectReference::from_map(value.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, TypeError::MalformedReference(_)));
    }

    #[test]
    fn non_string_referenced_id_is_error() {
        let value = json!({ "speckle_type": "reference", "referencedId": 12 });
        assert!(ObjectReference::from_map(value.as_object().unwrap()).is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let reference = ObjectReference::new(id(5), None, Closure::new());
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json, json!({ "referencedId": id(5).to_hex() }));
    }
}
