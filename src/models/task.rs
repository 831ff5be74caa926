//! Task model matching the backend ProjectTask record.

use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_null_vec, deserialize_opt_id, Priority, User};

/// Nesting level of a subtask below its parent.
pub const SUBTASK_LEVEL: i32 = 1;

/// Progress state of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "Todo", alias = "ToDo", alias = "TODO")]
    Todo,
    #[serde(alias = "InProgress", alias = "inProgress")]
    InProgress,
    #[serde(alias = "Completed", alias = "Done", alias = "done")]
    Completed,
}

/// A task, possibly a subtask of another task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub nested_level: i32,
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    pub assignees: Vec<User>,
}

impl Task {
    /// True if this task is a direct subtask of `parent_id`.
    pub fn is_subtask_of(&self, parent_id: &str) -> bool {
        self.nested_level == SUBTASK_LEVEL && self.parent_id.as_deref() == Some(parent_id)
    }

    pub fn is_assigned(&self, user_id: &str) -> bool {
        self.assignees.iter().any(|a| a.id == user_id)
    }
}

/// Partial update of a task. Only fields that changed are carried.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl TaskUpdate {
    /// Editable fields of `edited` that differ from `original`.
    pub fn diff(original: &Task, edited: &Task) -> Self {
        fn changed<T: Clone + PartialEq>(before: &T, after: &T) -> Option<T> {
            (before != after).then(|| after.clone())
        }

        Self {
            title: changed(&original.title, &edited.title),
            description: changed(&original.description, &edited.description)
                .map(Option::unwrap_or_default),
            priority: changed(&original.priority, &edited.priority),
            status: changed(&original.status, &edited.status),
            start_date: changed(&original.start_date, &edited.start_date)
                .map(Option::unwrap_or_default),
            end_date: changed(&original.end_date, &edited.end_date)
                .map(Option::unwrap_or_default),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields into a local record. An empty string clears an
    /// optional field.
    pub fn apply_to(&self, task: &mut Task) {
        fn cleared(value: &str) -> Option<String> {
            (!value.is_empty()).then(|| value.to_string())
        }

        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = cleared(description);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(start_date) = &self.start_date {
            task.start_date = cleared(start_date);
        }
        if let Some(end_date) = &self.end_date {
            task.end_date = cleared(end_date);
        }
    }
}

/// Request body for a new subtask under a parent task.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskDraft {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
}
