//! Data models for the project management client.
//!
//! These models mirror the backend JSON contract (camelCase fields) and are held
//! in the client state container.

mod attachment;
mod comment;
mod notification;
mod person;
mod project;
mod session;
mod task;

pub use attachment::*;
pub use comment::*;
pub use notification::*;
pub use person::*;
pub use project::*;
pub use session::*;
pub use task::*;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Priority shared by projects and tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[default]
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Urgent", alias = "URGENT")]
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Capitalized form, as project endpoints expect it.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

/// Project bodies carry priority capitalized; tasks use the lowercase form.
pub(crate) fn serialize_priority_label<S>(priority: &Priority, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(priority.label())
}

pub(crate) fn serialize_opt_priority_label<S>(
    priority: &Option<Priority>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match priority {
        Some(priority) => serializer.serialize_some(priority.label()),
        None => serializer.serialize_none(),
    }
}

/// Backend ids arrive as numbers or strings; both are held as strings.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Str(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Str(String),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Int(n)) => Some(n.to_string()),
        Some(RawId::Str(s)) => Some(s),
        None => None,
    })
}

/// Null collections decode as empty.
pub(crate) fn deserialize_null_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
