//! Comment endpoints.

use reqwest::Method;

use super::{decode_list, decode_one, ApiClient, Resource};
use crate::errors::ClientError;
use crate::models::{Comment, CreateCommentRequest};

const COMMENT: &str = "Comment";

impl ApiClient {
    /// GET /Comment/task/{taskId} - List the comments on a task.
    pub async fn list_comments(&self, task_id: &str) -> Result<Vec<Comment>, ClientError> {
        let body = self.call(Method::GET, &[COMMENT, "task", task_id]).await?;
        decode_list(body, Resource::Comments.field())
    }

    /// POST /Comment/{taskId} - Post a comment and return the stored record.
    pub async fn add_comment(&self, task_id: &str, content: &str) -> Result<Comment, ClientError> {
        let body = self
            .call_with_body(
                Method::POST,
                &[COMMENT, task_id],
                &CreateCommentRequest { content },
            )
            .await?;
        decode_one(body, "comment")
    }
}
