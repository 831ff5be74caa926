//! Session, token and credential models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh token pair as issued by the backend and persisted locally.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(alias = "token", alias = "access_token")]
    pub access_token: String,
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Role of the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Role {
    Owner,
    Admin,
    Member,
    Contributor,
    Other(String),
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Role::Owner,
            "admin" | "administrator" => Role::Admin,
            "member" | "user" => Role::Member,
            "contributor" => Role::Contributor,
            _ => Role::Other(s.trim().to_string()),
        }
    }

    /// Contributors may not change task assignees.
    pub fn can_assign(&self) -> bool {
        !matches!(self, Role::Contributor)
    }
}

/// The authenticated user's identity and token pair.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub tokens: TokenPair,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Login form input.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Signup form input.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of a token refresh request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub user_id: &'a str,
    pub refresh_token: &'a str,
}
