//! Routing surface.
//!
//! Screens are addressed by path. Protected screens require a session; the
//! login screen is skipped once logged in.

use std::fmt;

use crate::models::Person;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Signup,
    Home,
    Tasks,
    Projects,
    ProjectDetails(String),
    Inbox,
    Teams,
}

impl Route {
    /// Parse a path. Trailing slashes and query strings are ignored; unknown
    /// paths yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Root),
            ["login"] => Some(Route::Login),
            ["signup"] => Some(Route::Signup),
            ["home"] => Some(Route::Home),
            ["tasks"] => Some(Route::Tasks),
            ["projects"] => Some(Route::Projects),
            ["projects", id] => Some(Route::ProjectDetails((*id).to_string())),
            ["inbox"] => Some(Route::Inbox),
            ["teams"] => Some(Route::Teams),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Signup => "/signup".to_string(),
            Route::Home => "/home".to_string(),
            Route::Tasks => "/tasks".to_string(),
            Route::Projects => "/projects".to_string(),
            Route::ProjectDetails(id) => format!("/projects/{}", id),
            Route::Inbox => "/inbox".to_string(),
            Route::Teams => "/teams".to_string(),
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Root | Route::Login | Route::Signup)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of navigating to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

pub fn navigate(route: Route, authenticated: bool) -> Navigation {
    match route {
        Route::Root if authenticated => Navigation::Redirect(Route::Home),
        Route::Root => Navigation::Redirect(Route::Login),
        Route::Login if authenticated => Navigation::Redirect(Route::Home),
        r if r.is_protected() && !authenticated => Navigation::Redirect(Route::Login),
        r => Navigation::Render(r),
    }
}

/// People whose name or email contains `query`, ignoring case.
pub fn filter_people<'a>(people: &'a [Person], query: &str) -> Vec<&'a Person> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return people.iter().collect();
    }

    people
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&query) || p.email.to_lowercase().contains(&query)
        })
        .collect()
}
