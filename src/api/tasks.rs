//! Task endpoints.

use reqwest::Method;

use super::{decode_list, decode_one, ApiClient, Created, Resource};
use crate::errors::ClientError;
use crate::models::{SubtaskDraft, Task, TaskUpdate};

const PROJECT_TASK: &str = "ProjectTask";

impl ApiClient {
    /// GET /ProjectTask - List all tasks, subtasks included.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        let body = self.call(Method::GET, &[PROJECT_TASK]).await?;
        decode_list(body, Resource::Tasks.field())
    }

    /// GET /ProjectTask/{id} - Get a single task.
    pub async fn get_task(&self, id: &str) -> Result<Task, ClientError> {
        let body = self.call(Method::GET, &[PROJECT_TASK, id]).await?;
        decode_one(body, "task")
    }

    /// PATCH /ProjectTask/{id} - Update the given fields of a task.
    pub async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<(), ClientError> {
        self.call_with_body(Method::PATCH, &[PROJECT_TASK, id], update)
            .await?;
        Ok(())
    }

    /// POST /ProjectTask/{taskId}/assign/{userId} - Assign one user to a task.
    pub async fn assign_task(&self, task_id: &str, user_id: &str) -> Result<(), ClientError> {
        self.call(Method::POST, &[PROJECT_TASK, task_id, "assign", user_id])
            .await?;
        Ok(())
    }

    /// POST /ProjectTask/{parentId}/subtask/{userId} - Create a subtask.
    pub async fn add_subtask(
        &self,
        parent_id: &str,
        user_id: &str,
        draft: &SubtaskDraft,
    ) -> Result<Created<Task>, ClientError> {
        let body = self
            .call_with_body(
                Method::POST,
                &[PROJECT_TASK, parent_id, "subtask", user_id],
                draft,
            )
            .await?;
        Ok(Created::from_body(body, "task"))
    }
}
