//! JSON boundary for raw input and coerced output.

use crate::model::value::{format_float, Value, ValueMap};
use serde_json::{Map, Number};

impl Value {
    /// Converts a parsed JSON document into a raw value.
    ///
    /// Object keys become `String` keys; numbers that fit `i64` become
    /// integers, everything else becomes a float.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Nil,
            serde_json::Value::Bool(value) => Self::Boolean(value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => Self::Integer(value),
                None => number.as_f64().map(Self::Float).unwrap_or(Self::Nil),
            },
            serde_json::Value::String(value) => Self::String(value),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (Self::String(key), Self::from_json(value)))
                    .collect::<ValueMap>(),
            ),
        }
    }

    /// Renders a value as JSON.
    ///
    /// Symbols render as strings, structs as objects keyed by field name,
    /// foreign instances as `"#<TypeName>"`. Non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Nil => serde_json::Value::Null,
            Self::Boolean(value) => serde_json::Value::Bool(*value),
            Self::Integer(value) => serde_json::Value::Number(Number::from(*value)),
            Self::Float(value) => Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(value) | Self::Symbol(value) => serde_json::Value::String(value.clone()),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => {
                let mut object = Map::with_capacity(map.len());
                for (key, value) in map.iter() {
                    object.insert(json_key(key), value.to_json());
                }
                serde_json::Value::Object(object)
            }
            Self::Struct(value) => {
                let mut object = Map::with_capacity(value.fields().len());
                for (name, field) in value.fields() {
                    object.insert(name.clone(), field.to_json());
                }
                serde_json::Value::Object(object)
            }
            Self::Foreign(value) => serde_json::Value::String(format!("#<{}>", value.type_name())),
        }
    }
}

fn json_key(key: &Value) -> String {
    match key {
        Value::String(value) | Value::Symbol(value) => value.clone(),
        Value::Float(value) => format_float(*value),
        other => other.to_string(),
    }
}
