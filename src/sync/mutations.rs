//! Mutators: user actions that write to the backend and then patch state.
//!
//! Local state changes only after the backend accepted the write, so a failed
//! call leaves state as it was.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::{degrade, AssignReport, SyncClient, TaskDetails};
use crate::api::{Created, Resource};
use crate::errors::ClientError;
use crate::models::{
    project_color, Attachment, Comment, CreateProjectRequest, Project, ProjectDraft, SubtaskDraft,
    Task, TaskUpdate, UpdateProjectRequest, User,
};
use crate::state::{available_people, subtasks_of};

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ClientError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ClientError::Validation(format!("{} must be a date (YYYY-MM-DD), got {:?}", field, value))
    })
}

impl SyncClient {
    async fn require_user_id(&self) -> Result<String, ClientError> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or_else(|| ClientError::Unauthorized("Not logged in".to_string()))
    }

    // ==================== PROJECTS ====================

    /// Create a project coloured by its position among existing projects.
    ///
    /// The returned record is appended to state. When the backend answers
    /// without a recognizable record the project list is refetched instead and
    /// `None` is returned.
    pub async fn create_project(&self, draft: ProjectDraft) -> Result<Option<Project>, ClientError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ClientError::Validation("Project title is required".to_string()));
        }
        parse_date("Start date", &draft.start_date)?;
        parse_date("End date", &draft.end_date)?;

        let existing = self.state.read().await.projects.len();
        let request = CreateProjectRequest {
            title: title.to_string(),
            description: draft.description,
            priority: draft.priority,
            status: draft.status,
            start_date: draft.start_date.trim().to_string(),
            end_date: draft.end_date.trim().to_string(),
            color: project_color(existing).to_string(),
        };

        match self.api.create_project(&request).await {
            Ok(Created::Record(project)) => {
                tracing::info!("Created project {} ({})", project.id, project.title);
                self.state.write().await.add_project(project.clone());
                Ok(Some(project))
            }
            Ok(Created::Unrecognized) => {
                tracing::info!("Create project response carried no record; refetching projects");
                self.refresh_projects().await?;
                Ok(None)
            }
            Err(e) => {
                tracing::error!("Failed to create project {}: {}", request.title, e);
                Err(e)
            }
        }
    }

    /// Send the set fields of `update` and merge them locally on success.
    pub async fn update_project(
        &self,
        project_id: &str,
        update: &UpdateProjectRequest,
    ) -> Result<(), ClientError> {
        if update.is_empty() {
            return Ok(());
        }

        self.api
            .update_project(project_id, update)
            .await
            .inspect_err(|e| tracing::error!("Failed to update project {}: {}", project_id, e))?;

        self.state.write().await.patch_project(project_id, update);
        Ok(())
    }

    // ==================== TASKS ====================

    /// Persist the fields of `edited` that differ from `original`.
    ///
    /// Nothing is sent when nothing changed. Returns the update that was applied.
    pub async fn update_task(&self, original: &Task, edited: &Task) -> Result<TaskUpdate, ClientError> {
        let update = TaskUpdate::diff(original, edited);
        if update.is_empty() {
            tracing::debug!("Task {} unchanged; nothing to send", original.id);
            return Ok(update);
        }

        self.api
            .update_task(&original.id, &update)
            .await
            .inspect_err(|e| tracing::error!("Failed to update task {}: {}", original.id, e))?;

        self.state.write().await.patch_task(&original.id, &update);
        Ok(update)
    }

    /// Assign users to a task, one backend call per user in order.
    ///
    /// Users already assigned locally, and ids repeated in `user_ids`, are
    /// skipped without a call. Failures do not stop the loop and are not
    /// rolled back; only accepted users are added to local state.
    pub async fn assign_users(
        &self,
        task_id: &str,
        user_ids: &[String],
    ) -> Result<AssignReport, ClientError> {
        let (role, already_assigned, known_users) = {
            let state = self.state.read().await;
            let session = state
                .session
                .as_ref()
                .ok_or_else(|| ClientError::Unauthorized("Not logged in".to_string()))?;
            let assigned: HashSet<String> = state
                .task(task_id)
                .map(|t| t.assignees.iter().map(|a| a.id.clone()).collect())
                .unwrap_or_default();
            (session.role.clone(), assigned, state.users.clone())
        };

        if role.as_ref().is_some_and(|r| !r.can_assign()) {
            return Err(ClientError::Forbidden(
                "Contributors cannot change task assignees".to_string(),
            ));
        }

        let mut report = AssignReport::default();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut accepted: Vec<User> = Vec::new();

        for user_id in user_ids {
            if already_assigned.contains(user_id) || !seen.insert(user_id.as_str()) {
                report.skipped.push(user_id.clone());
                continue;
            }

            match self.api.assign_task(task_id, user_id).await {
                Ok(()) => {
                    report.assigned.push(user_id.clone());
                    accepted.push(self.user_record(&known_users, user_id).await);
                }
                Err(e) => {
                    tracing::error!("Failed to assign user {} to task {}: {}", user_id, task_id, e);
                    report.failed.push((user_id.clone(), e));
                }
            }
        }

        if report.is_partial() {
            tracing::warn!(
                "Task {} assignment partially failed: {} assigned, {} failed",
                task_id,
                report.assigned.len(),
                report.failed.len()
            );
        }

        self.state.write().await.add_assignees(task_id, accepted);
        Ok(report)
    }

    /// Full record for an assignee, from state or the backend.
    async fn user_record(&self, known: &[User], user_id: &str) -> User {
        if let Some(user) = known.iter().find(|u| u.id == user_id) {
            return user.clone();
        }
        match self.api.get_user(user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!("Could not load user {}: {}", user_id, e);
                User {
                    id: user_id.to_string(),
                    username: None,
                    name: None,
                    email: None,
                    role: None,
                }
            }
        }
    }

    /// Create a subtask under `parent_id`, owned by the session user.
    ///
    /// A recognizable created record is added to state; otherwise the task list
    /// is refetched and `None` is returned. Failures are not retried.
    pub async fn add_subtask(
        &self,
        parent_id: &str,
        draft: &SubtaskDraft,
    ) -> Result<Option<Task>, ClientError> {
        if draft.title.trim().is_empty() {
            return Err(ClientError::Validation("Subtask title is required".to_string()));
        }
        let user_id = self.require_user_id().await?;

        let created = self
            .api
            .add_subtask(parent_id, &user_id, draft)
            .await
            .inspect_err(|e| {
                tracing::error!("Failed to add subtask under task {}: {}", parent_id, e)
            })?;

        match created {
            Created::Record(task) => {
                self.state.write().await.upsert_task(task.clone());
                Ok(Some(task))
            }
            Created::Unrecognized => {
                self.refresh_tasks().await?;
                Ok(None)
            }
        }
    }

    /// Load everything shown when a task is opened and store it.
    pub async fn load_task_details(&self, task_id: &str) -> Result<TaskDetails, ClientError> {
        let (task, attachments, comments, all_tasks) = tokio::try_join!(
            self.api.get_task(task_id),
            self.api.list_attachments(task_id),
            self.api.list_comments(task_id),
            self.api.list_tasks(),
        )
        .inspect_err(|e| tracing::error!("Failed to load task {}: {}", task_id, e))?;

        let subtasks = subtasks_of(&all_tasks, task_id);

        let people = match task.project_id.as_deref() {
            Some(project_id) => match self.api.get_project(project_id).await {
                Ok(project) => available_people(&project, &task),
                Err(e) => {
                    tracing::error!("Failed to fetch project members for {}: {}", project_id, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        {
            let mut state = self.state.write().await;
            state.tasks = all_tasks;
            state.upsert_task(task.clone());
            state.set_attachments(task_id, attachments.clone());
            state.set_comments(task_id, comments.clone());
        }

        Ok(TaskDetails {
            task,
            attachments,
            comments,
            subtasks,
            people,
        })
    }

    // ==================== COMMENTS ====================

    /// Post a comment and append the backend's record as returned.
    pub async fn add_comment(&self, task_id: &str, content: &str) -> Result<Comment, ClientError> {
        if content.trim().is_empty() {
            return Err(ClientError::Validation("Comment cannot be empty".to_string()));
        }

        let comment = self
            .api
            .add_comment(task_id, content)
            .await
            .inspect_err(|e| tracing::warn!("Failed to add comment to task {}: {}", task_id, e))?;

        self.state.write().await.add_comment(task_id, comment.clone());
        Ok(comment)
    }

    pub async fn refresh_comments(&self, task_id: &str) -> Result<(), ClientError> {
        let (items, outcome) = degrade(Resource::Comments, self.api.list_comments(task_id).await);
        self.state.write().await.set_comments(task_id, items);
        outcome
    }

    // ==================== ATTACHMENTS ====================

    /// Upload one file, then replace the task's attachment list with a fresh copy.
    pub async fn upload_attachment(
        &self,
        task_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<Vec<Attachment>, ClientError> {
        if file_name.trim().is_empty() {
            return Err(ClientError::Validation("File name is required".to_string()));
        }

        self.api
            .upload_attachment(task_id, file_name, bytes, content_type)
            .await
            .inspect_err(|e| tracing::error!("Failed to upload {}: {}", file_name, e))?;

        self.reload_attachments(task_id).await
    }

    /// Delete an attachment, then replace the task's attachment list with a fresh copy.
    pub async fn remove_attachment(
        &self,
        task_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<Attachment>, ClientError> {
        self.api
            .delete_attachment(attachment_id)
            .await
            .inspect_err(|e| {
                tracing::error!("Failed to delete attachment {}: {}", attachment_id, e)
            })?;

        self.reload_attachments(task_id).await
    }

    async fn reload_attachments(&self, task_id: &str) -> Result<Vec<Attachment>, ClientError> {
        let attachments = self
            .api
            .list_attachments(task_id)
            .await
            .inspect_err(|e| {
                tracing::error!("Failed to refetch attachments for task {}: {}", task_id, e)
            })?;

        self.state
            .write()
            .await
            .set_attachments(task_id, attachments.clone());
        Ok(attachments)
    }

    pub async fn download_attachment(&self, attachment_id: &str) -> Result<Vec<u8>, ClientError> {
        self.api
            .download_attachment(attachment_id)
            .await
            .inspect_err(|e| {
                tracing::error!("Failed to download attachment {}: {}", attachment_id, e)
            })
    }

    /// Download an attachment into `dir` under its own name.
    pub async fn save_attachment(
        &self,
        attachment: &Attachment,
        dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        let bytes = self.download_attachment(&attachment.id).await?;

        let file_name = Path::new(attachment.download_name())
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "attachment".into());
        let path = dir.join(file_name);

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!("Saved attachment {} to {}", attachment.id, path.display());
        Ok(path)
    }

    // ==================== NOTIFICATIONS ====================

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<(), ClientError> {
        self.api
            .mark_notification_read(notification_id)
            .await
            .inspect_err(|e| {
                tracing::warn!("Failed to mark notification {} read: {}", notification_id, e)
            })?;

        self.state
            .write()
            .await
            .mark_notification_read(notification_id);
        Ok(())
    }

    pub async fn delete_notification(&self, notification_id: &str) -> Result<(), ClientError> {
        self.api
            .delete_notification(notification_id)
            .await
            .inspect_err(|e| {
                tracing::warn!("Failed to delete notification {}: {}", notification_id, e)
            })?;

        self.state.write().await.remove_notification(notification_id);
        Ok(())
    }
}
