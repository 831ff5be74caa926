//! Session store.
//!
//! Holds the persisted token pair, derives the acting identity from the access
//! token's claims and exchanges refresh tokens. There is no renewal loop:
//! refresh happens only when a session is restored or on explicit request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::api::ApiClient;
use crate::db::{LocalStore, TOKENS_KEY};
use crate::errors::ClientError;
use crate::models::{Role, Session, TokenPair};

const USER_ID_CLAIMS: [&str; 4] = [
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
    "nameid",
    "sub",
    "userId",
];
const USERNAME_CLAIMS: [&str; 4] = [
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
    "unique_name",
    "username",
    "name",
];
const EMAIL_CLAIMS: [&str; 2] = [
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
    "email",
];
const ROLE_CLAIMS: [&str; 2] = [
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
    "role",
];

/// Decode the claims segment of a JWT. The signature is not checked; the
/// backend does that on every request.
fn decode_claims(token: &str) -> Option<Map<String, Value>> {
    let mut parts = token.split('.');
    let (_header, payload) = (parts.next()?, parts.next()?);
    parts.next()?;

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// First claim among `keys` rendered as a string. Arrays yield their first entry.
fn claim(claims: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match claims.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(|v| v.as_str().map(str::to_string)),
        _ => None,
    })
}

/// Build a session from a token pair, ignoring expiry.
///
/// Returns `None` when the access token carries no user id or no `exp` claim.
pub fn decode_session(tokens: &TokenPair) -> Option<Session> {
    let claims = decode_claims(&tokens.access_token)?;

    let user_id = claim(&claims, &USER_ID_CLAIMS)?;
    let exp = match claims.get("exp")? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)?;

    Some(Session {
        user_id,
        username: claim(&claims, &USERNAME_CLAIMS),
        email: claim(&claims, &EMAIL_CLAIMS),
        role: claim(&claims, &ROLE_CLAIMS).map(|r| Role::parse(&r)),
        tokens: tokens.clone(),
        expires_at,
    })
}

/// Persisted session state plus the refresh exchange.
#[derive(Clone)]
pub struct SessionStore {
    storage: LocalStore,
    api: ApiClient,
}

impl SessionStore {
    pub fn new(storage: LocalStore, api: ApiClient) -> Self {
        Self { storage, api }
    }

    /// The persisted token pair, if any. Storage failures read as no session.
    pub async fn stored_tokens(&self) -> Option<TokenPair> {
        match self.storage.get_json::<TokenPair>(TOKENS_KEY).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!("Could not read stored tokens: {}", e);
                None
            }
        }
    }

    /// The current session if a stored access token exists and has not expired.
    pub async fn is_token_valid(&self) -> Option<Session> {
        self.is_token_valid_at(Utc::now()).await
    }

    pub async fn is_token_valid_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let tokens = self.stored_tokens().await?;
        let session = decode_session(&tokens)?;
        if session.is_expired_at(now) {
            tracing::debug!("Stored access token expired at {}", session.expires_at);
            return None;
        }
        Some(session)
    }

    /// Persist a freshly issued pair and return the session it describes.
    pub async fn save_tokens(&self, tokens: &TokenPair) -> Result<Session, ClientError> {
        let session = decode_session(tokens).ok_or_else(|| {
            ClientError::Decode("Access token does not carry a user id and expiry".to_string())
        })?;
        self.storage.set_json(TOKENS_KEY, tokens).await?;
        Ok(session)
    }

    /// Exchange a refresh token. On failure the stored pair is dropped and the
    /// caller must treat the session as logged out.
    pub async fn refresh_tokens(
        &self,
        user_id: &str,
        refresh_token: &str,
    ) -> Result<Session, ClientError> {
        let result = match self.api.refresh_tokens(user_id, refresh_token).await {
            Ok(tokens) => self.save_tokens(&tokens).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::warn!("Token refresh failed for user {}: {}", user_id, e);
            if let Err(clear_err) = self.clear().await {
                tracing::error!("Could not clear stored tokens: {}", clear_err);
            }
        }
        result
    }

    /// Restore a session at startup: a valid stored token is used as is, an
    /// expired one is refreshed once.
    pub async fn restore(&self) -> Option<Session> {
        if let Some(session) = self.is_token_valid().await {
            return Some(session);
        }

        let tokens = self.stored_tokens().await?;
        let Some(expired) = decode_session(&tokens) else {
            tracing::info!("Stored tokens are unusable; starting logged out");
            if let Err(e) = self.clear().await {
                tracing::error!("Could not clear stored tokens: {}", e);
            }
            return None;
        };

        self.refresh_tokens(&expired.user_id, &tokens.refresh_token)
            .await
            .ok()
    }

    /// Forget the persisted pair.
    pub async fn clear(&self) -> Result<(), ClientError> {
        self.storage.remove(TOKENS_KEY).await?;
        Ok(())
    }
}
