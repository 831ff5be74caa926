//! Comment model matching the backend Comment record.

use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_opt_id};

/// A comment posted on a task.
///
/// Fields the client does not interpret are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<serde_json::Value>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub post_date: Option<String>,
    #[serde(
        default,
        alias = "projectTaskId",
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Request body for a new comment.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentRequest<'a> {
    pub content: &'a str,
}
