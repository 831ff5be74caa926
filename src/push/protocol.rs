//! Hub JSON protocol framing.
//!
//! Every record is a JSON object terminated by the ASCII record separator. The
//! client opens with a handshake record, the server answers with `{}` (or an
//! `error`), after which records carry a numeric `type`.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::ClientError;

pub const RECORD_SEPARATOR: char = '\u{1e}';

const TYPE_INVOCATION: u8 = 1;
const TYPE_PING: u8 = 6;
const TYPE_CLOSE: u8 = 7;

/// A decoded hub record.
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    Invocation { target: String, arguments: Vec<Value> },
    Ping,
    Close { error: Option<String>, allow_reconnect: bool },
    /// Stream items, completions and other types the client does not use
    Other(u8),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    allow_reconnect: bool,
}

#[derive(Debug, Deserialize)]
struct HandshakeResponse {
    #[serde(default)]
    error: Option<String>,
}

fn record(value: Value) -> String {
    let mut out = value.to_string();
    out.push(RECORD_SEPARATOR);
    out
}

/// Opening record selecting the JSON protocol.
pub fn handshake_request() -> String {
    record(serde_json::json!({ "protocol": "json", "version": 1 }))
}

/// Keep-alive record.
pub fn ping_record() -> String {
    record(serde_json::json!({ "type": TYPE_PING }))
}

/// Non-empty records of a text frame. One frame may hold several records.
pub fn split_records(frame: &str) -> impl Iterator<Item = &str> {
    frame
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
}

/// Check the server's handshake answer.
pub fn check_handshake(record: &str) -> Result<(), ClientError> {
    let response: HandshakeResponse = serde_json::from_str(record)
        .map_err(|e| ClientError::Push(format!("Malformed handshake response: {}", e)))?;
    match response.error {
        Some(error) => Err(ClientError::Push(format!("Handshake rejected: {}", error))),
        None => Ok(()),
    }
}

pub fn parse_message(record: &str) -> Result<HubMessage, ClientError> {
    let raw: RawMessage = serde_json::from_str(record)
        .map_err(|e| ClientError::Push(format!("Malformed hub record: {}", e)))?;

    Ok(match raw.kind {
        TYPE_INVOCATION => HubMessage::Invocation {
            target: raw.target.unwrap_or_default(),
            arguments: raw.arguments,
        },
        TYPE_PING => HubMessage::Ping,
        TYPE_CLOSE => HubMessage::Close {
            error: raw.error,
            allow_reconnect: raw.allow_reconnect,
        },
        other => HubMessage::Other(other),
    })
}
