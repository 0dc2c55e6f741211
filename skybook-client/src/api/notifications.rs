//! Notification endpoints
//!
//! REST side of the notification feed: history, the authoritative unread
//! count, and per-item read receipts. The push side lives in the
//! application layer's notification channel.

use crate::gateway::ApiGateway;
use serde::Deserialize;
use skybook_core::{Notification, Page, SkybookResult};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct UnreadCountResponse {
    unread_count: u64,
}

/// Client for the notification endpoints
pub struct NotificationsApi {
    gateway: Arc<ApiGateway>,
}

impl NotificationsApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Fetch the most recent notifications for a user, newest first
    pub async fn recent(&self, user_id: Uuid) -> SkybookResult<Page<Notification>> {
        self.gateway
            .get_json(&format!("notifications/{}/", user_id))
            .await
    }

    /// Fetch the authoritative unread count for a user
    pub async fn unread_count(&self, user_id: Uuid) -> SkybookResult<u64> {
        let response: UnreadCountResponse = self
            .gateway
            .get_json(&format!("notifications/{}/unread-count/", user_id))
            .await?;
        Ok(response.unread_count)
    }

    /// Mark a single notification as read
    pub async fn mark_read(&self, notification_id: &str) -> SkybookResult<Notification> {
        self.gateway
            .patch_empty(&format!("notifications/{}/read/", notification_id))
            .await
    }
}
