//! Client state container.
//!
//! In-memory copy of every collection the client shows. All operations here
//! are synchronous patches; network round trips happen in the sync layer and
//! only touch this container once they complete.

use std::collections::HashMap;

use crate::models::{
    Attachment, Comment, Notification, Person, Project, Session, Task, TaskUpdate,
    UpdateProjectRequest, User,
};
use crate::push::PushEvent;

/// Global client state, discarded on logout.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    pub session: Option<Session>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub users: Vec<User>,
    pub notifications: Vec<Notification>,
    /// Comments keyed by task id
    pub comments: HashMap<String, Vec<Comment>>,
    /// Attachments keyed by task id
    pub attachments: HashMap<String, Vec<Attachment>>,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Drop the session and every collection.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ==================== PROJECTS ====================

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn add_project(&mut self, project: Project) {
        self.projects.push(project);
    }

    /// Merge an update into a project. Returns false if the project is unknown.
    pub fn patch_project(&mut self, id: &str, update: &UpdateProjectRequest) -> bool {
        match self.projects.iter_mut().find(|p| p.id == id) {
            Some(project) => {
                update.apply_to(project);
                true
            }
            None => false,
        }
    }

    // ==================== TASKS ====================

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn upsert_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    /// Merge an update into a task. Returns false if the task is unknown.
    pub fn patch_task(&mut self, id: &str, update: &TaskUpdate) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                update.apply_to(task);
                true
            }
            None => false,
        }
    }

    /// Append users to a task's assignee list, skipping ids already present.
    pub fn add_assignees(&mut self, task_id: &str, users: Vec<User>) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            for user in users {
                if !task.is_assigned(&user.id) {
                    task.assignees.push(user);
                }
            }
        }
    }

    /// Direct subtasks of `task_id`, in list order.
    pub fn subtasks_of(&self, task_id: &str) -> Vec<Task> {
        subtasks_of(&self.tasks, task_id)
    }

    pub fn tasks_for_project(&self, project_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.project_id.as_deref() == Some(project_id))
            .collect()
    }

    // ==================== COMMENTS & ATTACHMENTS ====================

    pub fn comments_for(&self, task_id: &str) -> &[Comment] {
        self.comments.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_comments(&mut self, task_id: &str, comments: Vec<Comment>) {
        self.comments.insert(task_id.to_string(), comments);
    }

    pub fn add_comment(&mut self, task_id: &str, comment: Comment) {
        self.comments
            .entry(task_id.to_string())
            .or_default()
            .push(comment);
    }

    pub fn attachments_for(&self, task_id: &str) -> &[Attachment] {
        self.attachments
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_attachments(&mut self, task_id: &str, attachments: Vec<Attachment>) {
        self.attachments.insert(task_id.to_string(), attachments);
    }

    // ==================== NOTIFICATIONS ====================

    /// Append a pushed event. No dedup, arrival order.
    pub fn apply_push(&mut self, event: PushEvent) {
        match event {
            PushEvent::Notification(notification) => self.notifications.push(notification),
        }
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read()).count()
    }

    pub fn mark_notification_read(&mut self, id: &str) -> bool {
        match self
            .notifications
            .iter_mut()
            .find(|n| n.id().as_deref() == Some(id))
        {
            Some(notification) => {
                notification.mark_read();
                true
            }
            None => false,
        }
    }

    pub fn remove_notification(&mut self, id: &str) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id().as_deref() != Some(id));
        self.notifications.len() != before
    }
}

/// Tasks whose nesting level is 1 and whose parent is `task_id`.
pub fn subtasks_of(tasks: &[Task], task_id: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.is_subtask_of(task_id))
        .cloned()
        .collect()
}

/// People that can still be assigned to `task`: the project owner first, then
/// members in order, de-duplicated by id or email, minus current assignees.
pub fn available_people(project: &Project, task: &Task) -> Vec<Person> {
    let mut people: Vec<Person> = Vec::new();

    if let Some(owner) = &project.owner {
        people.push(Person::owner(owner));
    }

    for (index, member) in project.members.iter().enumerate() {
        if people.iter().any(|p| p.same_as(member)) {
            continue;
        }
        people.push(Person::member(member, index));
    }

    people.retain(|p| !task.is_assigned(&p.id));
    people
}
