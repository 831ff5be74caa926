//! Users as returned by the backend, and the assignable people derived from them.

use serde::{Deserialize, Serialize};

use super::{deserialize_id, Role};

/// A backend user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    /// Best available display name: username, name, email local part, then `fallback`.
    pub fn display_name(&self, fallback: &str) -> String {
        non_empty(&self.username)
            .or_else(|| non_empty(&self.name))
            .map(str::to_string)
            .or_else(|| {
                non_empty(&self.email)
                    .and_then(|email| email.split('@').next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().map(Role::parse)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Colours used for people avatars; the owner always takes the first.
pub const PERSON_COLORS: [&str; 8] = [
    "cyan", "purple", "red", "green", "yellow", "blue", "pink", "orange",
];

/// Someone who can be assigned to a task.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub email: String,
    pub initials: String,
    pub role: String,
    pub color: String,
}

impl Person {
    /// Project owner entry.
    pub fn owner(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.display_name("Owner"),
            email: user.email.clone().unwrap_or_default(),
            initials: initials(&label_source(user)),
            role: "Owner".to_string(),
            color: PERSON_COLORS[0].to_string(),
        }
    }

    /// Project member entry at position `index` in the member list.
    pub fn member(user: &User, index: usize) -> Self {
        Self {
            id: user.id.clone(),
            name: user.display_name("User"),
            email: user.email.clone().unwrap_or_default(),
            initials: initials(&label_source(user)),
            role: user.role.clone().unwrap_or_else(|| "Member".to_string()),
            color: PERSON_COLORS[(index + 1) % PERSON_COLORS.len()].to_string(),
        }
    }

    /// True if this person and `user` are the same by id or by email.
    pub fn same_as(&self, user: &User) -> bool {
        if self.id == user.id {
            return true;
        }
        match non_empty(&user.email) {
            Some(email) => !self.email.is_empty() && self.email == email,
            None => false,
        }
    }
}

fn label_source(user: &User) -> String {
    non_empty(&user.username)
        .or_else(|| non_empty(&user.name))
        .or_else(|| non_empty(&user.email))
        .unwrap_or_default()
        .to_string()
}

/// First character of every whitespace separated word, upper-cased.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
