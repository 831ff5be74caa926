//! Authentication endpoints.

use reqwest::Method;

use super::{decode_one, ApiClient};
use crate::errors::ClientError;
use crate::models::{Credentials, RefreshRequest, SignupRequest, TokenPair};

const AUTH: &str = "Auth";

impl ApiClient {
    /// POST /Auth/login - Exchange credentials for a token pair.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ClientError> {
        let body = self
            .call_with_body(Method::POST, &[AUTH, "login"], credentials)
            .await?;
        decode_one(body, "tokens")
    }

    /// POST /Auth/register - Create an account.
    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ClientError> {
        self.call_with_body(Method::POST, &[AUTH, "register"], request)
            .await?;
        Ok(())
    }

    /// POST /Auth/refresh-token - Exchange a refresh token for a new pair.
    pub async fn refresh_tokens(
        &self,
        user_id: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, ClientError> {
        let request = RefreshRequest {
            user_id,
            refresh_token,
        };
        let body = self
            .call_with_body(Method::POST, &[AUTH, "refresh-token"], &request)
            .await?;
        decode_one(body, "tokens")
    }
}
