//! Schema inference from concrete JSON values.
//!
//! Postman collections carry example payloads, not schemas, so the importer
//! derives a shape from whatever the author last sent.

use apidoc_jsonschema::{ArraySchema, BoolOr, ObjectSchema, Schema, TypeName};
use serde_json::Value;

/// Describe one concrete JSON value. Arrays take their item shape from the
/// first element; objects keep key order.
pub(crate) fn schema_from_json(value: &Value) -> Schema {
    match value {
        Value::Null => Schema::of_type(TypeName::Null),
        Value::Bool(_) => Schema::of_type(TypeName::Boolean),
        Value::Number(n) if n.is_i64() || n.is_u64() => Schema::of_type(TypeName::Integer),
        Value::Number(_) => Schema::of_type(TypeName::Number),
        Value::String(_) => Schema::of_type(TypeName::String),
        Value::Array(items) => Schema::array(ArraySchema {
            items: items
                .first()
                .map(|item| BoolOr::Value(Box::new(schema_from_json(item)))),
            ..ArraySchema::default()
        }),
        Value::Object(map) => {
            let mut shape = ObjectSchema::default();
            for (key, item) in map {
                shape.properties.insert(key.clone(), schema_from_json(item));
            }
            Schema::object(shape)
        }
    }
}

/// Infer a schema from a raw request or response body, together with the
/// example value worth keeping. Text that is not valid JSON degrades to an
/// untyped object carrying the text itself as its example.
pub(crate) fn schema_from_raw_json(raw: &str) -> (Schema, Option<Value>) {
    if raw.trim().is_empty() {
        return (Schema::of_type(TypeName::Object), None);
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => (schema_from_json(&value), Some(value)),
        Err(error) => {
            tracing::warn!(%error, "raw body is not valid JSON, describing it as an object");
            (
                Schema::of_type(TypeName::Object),
                Some(Value::String(raw.to_string())),
            )
        }
    }
}
