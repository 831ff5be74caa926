//! Attachment endpoints, including binary upload and download.

use reqwest::multipart::{Form, Part};
use reqwest::Method;

use super::{decode_list, ApiClient, Resource};
use crate::errors::ClientError;
use crate::models::Attachment;

const ATTACHMENT: &str = "Attachment";

impl ApiClient {
    /// GET /Attachment/task/{taskId} - List the attachments of a task.
    pub async fn list_attachments(&self, task_id: &str) -> Result<Vec<Attachment>, ClientError> {
        let body = self
            .call(Method::GET, &[ATTACHMENT, "task", task_id])
            .await?;
        decode_list(body, Resource::Attachments.field())
    }

    /// POST /Attachment/{taskId} - Upload a single file as multipart field `file`.
    pub async fn upload_attachment(
        &self,
        task_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), ClientError> {
        let mut part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(mime) = content_type {
            part = part.mime_str(mime).map_err(|e| {
                ClientError::Validation(format!("Invalid content type {}: {}", mime, e))
            })?;
        }
        let form = Form::new().part("file", part);

        self.call_multipart(&[ATTACHMENT, task_id], form).await?;
        Ok(())
    }

    /// GET /Attachment/{id}/download - Fetch the file contents.
    pub async fn download_attachment(&self, id: &str) -> Result<Vec<u8>, ClientError> {
        self.call_bytes(&[ATTACHMENT, id, "download"]).await
    }

    /// DELETE /Attachment/{id} - Remove an attachment.
    pub async fn delete_attachment(&self, id: &str) -> Result<(), ClientError> {
        self.call(Method::DELETE, &[ATTACHMENT, id]).await?;
        Ok(())
    }
}
