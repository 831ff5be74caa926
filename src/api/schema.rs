//! Documented response schema.
//!
//! A list response is either a bare JSON array or an object holding the array
//! under the resource's field name. A single record is either the bare object or
//! the object under its singular field name. Anything else is a decode error.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ClientError;

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode a list response.
pub fn decode_list<T: DeserializeOwned>(body: Value, field: &str) -> Result<Vec<T>, ClientError> {
    match body {
        list @ Value::Array(_) => Ok(serde_json::from_value(list)?),
        Value::Object(mut map) => match map.remove(field) {
            Some(list @ Value::Array(_)) => Ok(serde_json::from_value(list)?),
            Some(other) => Err(ClientError::Decode(format!(
                "Field `{}` holds {} instead of an array",
                field,
                shape(&other)
            ))),
            None => Err(ClientError::Decode(format!(
                "Expected an array or an object with `{}`",
                field
            ))),
        },
        other => Err(ClientError::Decode(format!(
            "Expected an array or an object with `{}`, got {}",
            field,
            shape(&other)
        ))),
    }
}

/// Decode a single-record response.
pub fn decode_one<T: DeserializeOwned>(body: Value, field: &str) -> Result<T, ClientError> {
    let record = match body {
        Value::Object(mut map) => match map.remove(field) {
            Some(inner @ Value::Object(_)) => inner,
            Some(other) => {
                map.insert(field.to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => {
            return Err(ClientError::Decode(format!(
                "Expected a `{}` object, got {}",
                field,
                shape(&other)
            )))
        }
    };
    Ok(serde_json::from_value(record)?)
}

/// Outcome of a create call whose response may not carry the created record.
#[derive(Debug, Clone, PartialEq)]
pub enum Created<T> {
    Record(T),
    /// The call succeeded but the body did not decode as a record.
    Unrecognized,
}

impl<T: DeserializeOwned> Created<T> {
    pub fn from_body(body: Value, field: &str) -> Self {
        match decode_one(body, field) {
            Ok(record) => Created::Record(record),
            Err(e) => {
                tracing::debug!("Create response did not carry a `{}`: {}", field, e);
                Created::Unrecognized
            }
        }
    }
}
