//! Error handling module for the project management client.
//!
//! Provides a classified error type so callers can tell an authentication failure
//! from a transport failure from a payload that does not match the documented schema.

use reqwest::StatusCode;
use serde::Deserialize;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const HTTP_ERROR: &str = "HTTP_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const PUSH_ERROR: &str = "PUSH_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Client error type.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Bad credentials, missing or rejected token
    Unauthorized(String),
    /// Authenticated but not allowed to perform the action
    Forbidden(String),
    /// Resource not found
    NotFound(String),
    /// Rejected input, either locally or by the backend
    Validation(String),
    /// Any other non-success HTTP status
    Http { status: u16, message: String },
    /// Connection, timeout or other transport failure
    Network(String),
    /// Response body does not match the documented schema
    Decode(String),
    /// Local storage failure
    Storage(String),
    /// Push channel failure
    Push(String),
    /// Internal error
    Internal(String),
}

impl ClientError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Unauthorized(_) => codes::UNAUTHORIZED,
            ClientError::Forbidden(_) => codes::FORBIDDEN,
            ClientError::NotFound(_) => codes::NOT_FOUND,
            ClientError::Validation(_) => codes::VALIDATION_ERROR,
            ClientError::Http { .. } => codes::HTTP_ERROR,
            ClientError::Network(_) => codes::NETWORK_ERROR,
            ClientError::Decode(_) => codes::DECODE_ERROR,
            ClientError::Storage(_) => codes::STORAGE_ERROR,
            ClientError::Push(_) => codes::PUSH_ERROR,
            ClientError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            ClientError::Unauthorized(msg) => msg.clone(),
            ClientError::Forbidden(msg) => msg.clone(),
            ClientError::NotFound(msg) => msg.clone(),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Http { status, message } => format!("HTTP {}: {}", status, message),
            ClientError::Network(msg) => msg.clone(),
            ClientError::Decode(msg) => msg.clone(),
            ClientError::Storage(msg) => msg.clone(),
            ClientError::Push(msg) => msg.clone(),
            ClientError::Internal(msg) => msg.clone(),
        }
    }

    /// True when the session must be treated as logged out.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// True for failures that say nothing about the data itself.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Push(_) => true,
            ClientError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            _ => ClientError::Http {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            tracing::warn!("Response decode error: {:?}", err);
            return ClientError::Decode(format!("Response decode error: {}", err));
        }
        if let Some(status) = err.status() {
            return ClientError::from_status(status, "");
        }
        tracing::warn!("Network error: {:?}", err);
        ClientError::Network(format!("Network error: {}", err))
    }
}

impl From<sqlx::Error> for ClientError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Storage error: {:?}", err);
        ClientError::Storage(format!("Storage error: {}", err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        tracing::warn!("JSON error: {:?}", err);
        ClientError::Decode(format!("JSON error: {}", err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        match &err {
            tokio_tungstenite::tungstenite::Error::Http(response)
                if response.status() == StatusCode::UNAUTHORIZED.as_u16() =>
            {
                ClientError::Unauthorized("Push channel rejected the access token".to_string())
            }
            _ => {
                tracing::warn!("Push transport error: {:?}", err);
                ClientError::Push(format!("Push transport error: {}", err))
            }
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("IO error: {:?}", err);
        ClientError::Internal(format!("IO error: {}", err))
    }
}

/// Error body shapes the backend is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerErrorBody {
    Message { message: String },
    Title { title: String },
    Error { error: String },
}

/// Extract a human readable message from an error response body.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ServerErrorBody>(trimmed) {
        Ok(ServerErrorBody::Message { message }) => Some(message),
        Ok(ServerErrorBody::Title { title }) => Some(title),
        Ok(ServerErrorBody::Error { error }) => Some(error),
        Err(_) => Some(trimmed.chars().take(200).collect()),
    }
}
