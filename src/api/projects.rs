//! Project endpoints.

use reqwest::Method;

use super::{decode_list, decode_one, ApiClient, Created, Resource};
use crate::errors::ClientError;
use crate::models::{CreateProjectRequest, Project, UpdateProjectRequest};

const PROJECT: &str = "Project";

impl ApiClient {
    /// GET /Project - List all projects visible to the session user.
    pub async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        let body = self.call(Method::GET, &[PROJECT]).await?;
        decode_list(body, Resource::Projects.field())
    }

    /// GET /Project/{id} - Get a single project.
    pub async fn get_project(&self, id: &str) -> Result<Project, ClientError> {
        let body = self.call(Method::GET, &[PROJECT, id]).await?;
        decode_one(body, "project")
    }

    /// POST /Project - Create a project.
    pub async fn create_project(
        &self,
        request: &CreateProjectRequest,
    ) -> Result<Created<Project>, ClientError> {
        let body = self
            .call_with_body(Method::POST, &[PROJECT], request)
            .await?;
        Ok(Created::from_body(body, "project"))
    }

    /// PATCH /Project/{id} - Update the given fields of a project.
    pub async fn update_project(
        &self,
        id: &str,
        request: &UpdateProjectRequest,
    ) -> Result<(), ClientError> {
        self.call_with_body(Method::PATCH, &[PROJECT, id], request)
            .await?;
        Ok(())
    }
}
