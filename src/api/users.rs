//! User endpoints.

use reqwest::Method;

use super::{decode_list, decode_one, ApiClient, Resource};
use crate::errors::ClientError;
use crate::models::User;

const USER: &str = "User";

impl ApiClient {
    /// GET /User - List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        let body = self.call(Method::GET, &[USER]).await?;
        decode_list(body, Resource::Users.field())
    }

    /// GET /User/{id} - Get a single user.
    pub async fn get_user(&self, id: &str) -> Result<User, ClientError> {
        let body = self.call(Method::GET, &[USER, id]).await?;
        decode_one(body, "user")
    }
}
