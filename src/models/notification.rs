//! Notification model, shared by the REST listing and the push channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A notification addressed to the session user.
///
/// The record is held exactly as the backend sent it. Accessors read the
/// fields the client interprets; a payload without them is still kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Notification {
    payload: Value,
}

impl Notification {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// Backend id, numbers rendered as strings.
    pub fn id(&self) -> Option<String> {
        match self.payload.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Message text. A bare string payload is its own message.
    pub fn message(&self) -> Option<&str> {
        match &self.payload {
            Value::String(s) => Some(s.as_str()),
            other => other.get("message")?.as_str(),
        }
    }

    pub fn created_at(&self) -> Option<&str> {
        self.payload.get("createdAt")?.as_str()
    }

    pub fn is_read(&self) -> bool {
        ["isRead", "read"]
            .iter()
            .any(|key| self.payload.get(*key).and_then(Value::as_bool) == Some(true))
    }

    /// Flag the record as read. Non-object payloads are left unchanged.
    pub fn mark_read(&mut self) {
        if let Some(fields) = self.payload.as_object_mut() {
            if fields.contains_key("read") {
                fields.insert("read".to_string(), Value::Bool(true));
            }
            fields.insert("isRead".to_string(), Value::Bool(true));
        }
    }

    /// Any field of the record, interpreted or not.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

impl From<Value> for Notification {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}
