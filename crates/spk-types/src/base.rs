use serde_json::{Map, Value};

/// Schema discriminator carried by every base object.
pub const SPECKLE_TYPE: &str = "speckle_type";
/// Content hash of a traversed object.
pub const ID: &str = "id";
/// Closure table of a traversed object.
pub const CLOSURE: &str = "__closure";
/// Host-side identifier used to build [`ObjectReference`](crate::ObjectReference)s.
pub const APPLICATION_ID: &str = "applicationId";
/// Target id of a reference stub.
pub const REFERENCED_ID: &str = "referencedId";
/// Optional count of detached descendants.
pub const TOTAL_CHILDREN_COUNT: &str = "totalChildrenCount";

/// `speckle_type` of reference stubs.
pub const REFERENCE_TYPE: &str = "reference";
/// `speckle_type` of chunk holders.
pub const DATA_CHUNK_TYPE: &str = "Speckle.Core.Models.DataChunk";
/// Property of a chunk holder that carries the slice.
pub const DATA_CHUNK_FIELD: &str = "data";

/// Builder for base objects.
///
/// A base object is a JSON map with a string `speckle_type`. Properties keep
/// their raw names, markers included:
///
/// ```
/// use spk_types::Base;
///
/// let line = Base::new("Objects.Geometry.Line")
///     .with("units", "m")
///     .with("@detail", Base::new("Detail").with("note", "n"))
///     .into_value();
/// assert_eq!(line["speckle_type"], "Objects.Geometry.Line");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Base(Map<String, Value>);

impl Base {
    pub fn new(speckle_type: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(SPECKLE_TYPE.into(), Value::String(speckle_type.into()));
        Self(map)
    }

    /// Set a property and return the builder.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a property in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn speckle_type(&self) -> Option<&str> {
        self.0.get(SPECKLE_TYPE).and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Base> for Value {
    fn from(base: Base) -> Self {
        base.into_value()
    }
}

/// One fixed-size slice of a chunked array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataChunk {
    pub data: Vec<Value>,
}

impl DataChunk {
    pub fn new(data: Vec<Value>) -> Self {
        Self { data }
    }

    /// `{ "speckle_type": "Speckle.Core.Models.DataChunk", "data": [...] }`
    pub fn to_value(&self) -> Value {
        Base::new(DATA_CHUNK_TYPE)
            .with(DATA_CHUNK_FIELD, Value::Array(self.data.clone()))
            .into_value()
    }

    /// Recognize a chunk holder, traversed or not.
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        if map.get(SPECKLE_TYPE).and_then(Value::as_str) != Some(DATA_CHUNK_TYPE) {
            return None;
        }
        let data = map.get(DATA_CHUNK_FIELD)?.as_array()?.clone();
        Some(Self { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_sets_speckle_type() {
        let base = Base::new("Point").with("x", 1.0);
        assert_eq!(base.speckle_type(), Some("Point"));
        assert_eq!(base.into_value(), json!({ "speckle_type": "Point", "x": 1.0 }));
    }

    #[test]
    fn builder_overwrites() {
        let mut base = Base::new("Point").with("x", 1);
        base.set("x", 2);
        assert_eq!(base.as_map()["x"], 2);
    }

    #[test]
    fn data_chunk_shape() {
        let chunk = DataChunk::new(vec![json!(1), json!(2)]);
        assert_eq!(
            chunk.to_value(),
            json!({ "speckle_type": "Speckle.Core.Models.DataChunk", "data": [1, 2] })
        );
    }

    #[test]
    fn data_chunk_recognized() {
        let value = DataChunk::new(vec![json!("a")]).to_value();
        let chunk = DataChunk::from_map(value.as_object().unwrap()).unwrap();
        assert_eq!(chunk.data, vec![json!("a")]);
        assert!(DataChunk::from_map(Base::new("Other").as_map()).is_none());
    }
}
