//! Outcome types returned by the sync layer.

use crate::api::Resource;
use crate::errors::ClientError;
use crate::models::{Attachment, Comment, Person, Task};

/// A collection that could not be fetched and was reset to empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub resource: Resource,
    pub error: ClientError,
}

/// Result of populating several collections at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub failures: Vec<FetchFailure>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure(&self, resource: Resource) -> Option<&ClientError> {
        self.failures
            .iter()
            .find(|f| f.resource == resource)
            .map(|f| &f.error)
    }

    /// Take the collection out of `result`, recording a failure as empty.
    pub(crate) fn settle<T>(&mut self, resource: Resource, result: Result<Vec<T>, ClientError>) -> Vec<T> {
        let (items, outcome) = degrade(resource, result);
        if let Err(error) = outcome {
            self.failures.push(FetchFailure { resource, error });
        }
        items
    }
}

/// Fetch failures degrade to an empty collection; the error is logged and
/// handed back so callers can still tell it apart from "no data".
pub(crate) fn degrade<T>(
    resource: Resource,
    result: Result<Vec<T>, ClientError>,
) -> (Vec<T>, Result<(), ClientError>) {
    match result {
        Ok(items) => {
            tracing::debug!("Fetched {} {}", items.len(), resource);
            (items, Ok(()))
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", resource, e);
            (Vec::new(), Err(e))
        }
    }
}

/// Per-user outcome of an assign action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignReport {
    /// Users the backend accepted, in request order
    pub assigned: Vec<String>,
    /// Users already assigned locally or repeated in the request
    pub skipped: Vec<String>,
    pub failed: Vec<(String, ClientError)>,
}

impl AssignReport {
    pub fn is_partial(&self) -> bool {
        !self.assigned.is_empty() && !self.failed.is_empty()
    }
}

/// Everything shown when a task is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDetails {
    pub task: Task,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<Comment>,
    pub subtasks: Vec<Task>,
    /// Project people not yet assigned to the task
    pub people: Vec<Person>,
}
