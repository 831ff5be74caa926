//! Project model matching the backend Project record.

use serde::{Deserialize, Serialize};

use super::{
    deserialize_id, deserialize_null_vec, serialize_opt_priority_label, serialize_priority_label,
    Priority, User,
};

/// Colours handed out to new projects in creation order.
pub const PROJECT_COLORS: [&str; 8] = [
    "#06b6d4", "#a855f7", "#ef4444", "#22c55e", "#eab308", "#3b82f6", "#ec4899", "#f97316",
];

/// Colour for the next project given how many already exist.
pub fn project_color(existing_count: usize) -> &'static str {
    PROJECT_COLORS[existing_count % PROJECT_COLORS.len()]
}

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ProjectStatus {
    #[default]
    #[serde(alias = "notStarted", alias = "not_started")]
    NotStarted,
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "paused")]
    Paused,
    #[serde(alias = "completed")]
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::NotStarted => "NotStarted",
            ProjectStatus::Active => "Active",
            ProjectStatus::Paused => "Paused",
            ProjectStatus::Completed => "Completed",
        }
    }
}

/// A project grouping tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(
        default,
        alias = "projectOwner",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<User>,
    #[serde(
        default,
        alias = "assignees",
        alias = "assignedUsers",
        deserialize_with = "deserialize_null_vec"
    )]
    pub members: Vec<User>,
}

/// Request body for creating a new project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    #[serde(serialize_with = "serialize_priority_label")]
    pub priority: Priority,
    pub status: ProjectStatus,
    pub start_date: String,
    pub end_date: String,
    pub color: String,
}

/// Request body for updating an existing project. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_priority_label"
    )]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl UpdateProjectRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields into a local record.
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title = title.clone();
        }
        if let Some(description) = &self.description {
            project.description = Some(description.clone());
        }
        if let Some(priority) = self.priority {
            project.priority = priority;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(start_date) = &self.start_date {
            project.start_date = Some(start_date.clone());
        }
        if let Some(end_date) = &self.end_date {
            project.end_date = Some(end_date.clone());
        }
        if let Some(color) = &self.color {
            project.color = Some(color.clone());
        }
    }
}

/// Form input for a new project before a colour is chosen.
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: ProjectStatus,
    pub start_date: String,
    pub end_date: String,
}
