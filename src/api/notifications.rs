//! Notification endpoints.

use reqwest::Method;

use super::{decode_list, ApiClient, Resource};
use crate::errors::ClientError;
use crate::models::Notification;

const NOTIFICATION: &str = "Notification";

impl ApiClient {
    /// GET /Notification/{userId} - List a user's notifications.
    pub async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>, ClientError> {
        let body = self.call(Method::GET, &[NOTIFICATION, user_id]).await?;
        decode_list(body, Resource::Notifications.field())
    }

    /// PUT /Notification/{id}/read - Mark a notification as read.
    pub async fn mark_notification_read(&self, id: &str) -> Result<(), ClientError> {
        self.call(Method::PUT, &[NOTIFICATION, id, "read"]).await?;
        Ok(())
    }

    /// DELETE /Notification/{id} - Delete a notification.
    pub async fn delete_notification(&self, id: &str) -> Result<(), ClientError> {
        self.call(Method::DELETE, &[NOTIFICATION, id]).await?;
        Ok(())
    }
}
