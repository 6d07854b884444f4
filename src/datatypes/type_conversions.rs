// src/datatypes/type_conversions.rs
// Conversions between filter input JSON and runtime values
use crate::datatypes::values::Value;
use crate::error::{FilterError, Result};
use serde_json::Value as JsonValue;

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else {
                    Value::Float64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Value::from(&json)
    }
}

impl Value {
    pub fn to_json(&self) -> JsonValue {
        // Serialization of Value is infallible: every variant maps onto JSON.
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Convert a caller-supplied filter value for binding. Integers beyond the
/// `i64` range are rejected rather than rounded into a float.
pub fn filter_value(key: &str, json: &JsonValue) -> Result<Value> {
    match json {
        JsonValue::Number(n) if n.is_u64() && n.as_i64().is_none() => Err(
            FilterError::invalid_value(key, "an integer within the 64-bit signed range"),
        ),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| filter_value(key, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        JsonValue::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), filter_value(key, v)?)))
            .collect::<Result<_>>()
            .map(Value::Map),
        other => Ok(Value::from(other)),
    }
}

/// Interpret a string as the numeric type a schema field declares, so decoded
/// identifiers bind with the same type the property is stored as.
pub fn coerce_scalar(raw: &str, type_name: &str) -> Value {
    match type_name {
        "Int" | "BigInt" => raw
            .parse::<i64>()
            .map(Value::Int64)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        "Float" => raw
            .parse::<f64>()
            .map(Value::Float64)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}
