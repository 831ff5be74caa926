//! REST API client.
//!
//! One authenticated round trip per call. Resource-specific calls live in the
//! submodules as `impl ApiClient` blocks; decoding of the documented response
//! schema lives in `schema`.

mod attachments;
mod auth;
mod comments;
mod notifications;
mod projects;
mod schema;
mod tasks;
mod users;

pub use schema::*;

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::ClientError;

/// Backend collections the client keeps in state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Projects,
    Tasks,
    Users,
    Comments,
    Attachments,
    Notifications,
}

impl Resource {
    /// Field a collection may be nested under in a list response.
    pub fn field(&self) -> &'static str {
        match self {
            Resource::Projects => "projects",
            Resource::Tasks => "tasks",
            Resource::Users => "users",
            Resource::Comments => "comments",
            Resource::Attachments => "attachments",
            Resource::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// HTTP client for the backend REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    access_token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|e| {
            ClientError::Internal(format!("Invalid API base URL {}: {}", base_url, e))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::Internal(format!(
                "API base URL {} cannot carry a path",
                base_url
            )));
        }

        let http = Client::builder()
            .user_agent(concat!("pm-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: parsed,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Set or clear the bearer token attached to every request.
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    pub async fn has_access_token(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    /// Base URL joined with percent-encoded path segments.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        tracing::debug!("{} {}", method, url);
        let builder = self.http.request(method, url);
        match self.access_token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and classify non-success statuses.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_status(status, &body);
        tracing::debug!("Request to {} failed: {}", url, err);
        Err(err)
    }

    /// Parse a JSON body; an empty body reads as `null`.
    async fn read_json(response: Response) -> Result<Value, ClientError> {
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub(crate) async fn call(&self, method: Method, segments: &[&str]) -> Result<Value, ClientError> {
        let builder = self.request(method, segments).await;
        let response = self.execute(builder).await?;
        Self::read_json(response).await
    }

    pub(crate) async fn call_with_body<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<Value, ClientError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let builder = self.request(method, segments).await.json(body);
        let response = self.execute(builder).await?;
        Self::read_json(response).await
    }

    pub(crate) async fn call_multipart(
        &self,
        segments: &[&str],
        form: reqwest::multipart::Form,
    ) -> Result<Value, ClientError> {
        let builder = self.request(Method::POST, segments).await.multipart(form);
        let response = self.execute(builder).await?;
        Self::read_json(response).await
    }

    pub(crate) async fn call_bytes(&self, segments: &[&str]) -> Result<Vec<u8>, ClientError> {
        let builder = self.request(Method::GET, segments).await;
        let response = self.execute(builder).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
