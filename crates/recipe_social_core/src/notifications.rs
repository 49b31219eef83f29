//! crates/recipe_social_core/src/notifications.rs
//!
//! Read side of the notifications written by `events::NotificationWriter`.

use crate::domain::Notification;
use crate::paths::{self, require_ids};
use crate::ports::{
    from_document, Direction, DocumentStore, PortError, PortResult, Query, ResultExt,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct NotificationInbox {
    store: Arc<dyn DocumentStore>,
}

impl NotificationInbox {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list_notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> PortResult<Vec<Notification>> {
        require_ids(&[("userId", user_id)])?;
        let query = Query::new()
            .where_eq("recipientId", user_id)
            .order_by("createdAt", Direction::Descending)
            .limit(limit.clamp(1, 100));
        self.store
            .query(&paths::notifications(), &query)
            .await
            .context("load notifications")?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Marks one of `user_id`'s notifications as read. Someone else's
    /// notification fails with `InvalidArgument` and is left untouched.
    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> PortResult<()> {
        require_ids(&[("userId", user_id), ("notificationId", notification_id)])?;
        let path = paths::notifications().doc(notification_id);
        let notification: Notification = self
            .store
            .get(&path)
            .await
            .context("load notification")?
            .ok_or_else(|| {
                PortError::NotFound(format!("Notification {} not found", notification_id))
            })
            .and_then(from_document::<Notification>)?;
        if notification.recipient_id != user_id {
            return Err(PortError::InvalidArgument(format!(
                "notification {} does not belong to user {}",
                notification_id, user_id
            )));
        }

        let mut fields = Map::new();
        fields.insert("read".into(), Value::Bool(true));
        self.store
            .update(&path, fields)
            .await
            .context("mark notification read")
    }

    /// Zero on any failure.
    pub async fn unread_count(&self, user_id: &str) -> u64 {
        if require_ids(&[("userId", user_id)]).is_err() {
            return 0;
        }
        let query = Query::new()
            .where_eq("recipientId", user_id)
            .where_eq("read", false);
        match self.store.query(&paths::notifications(), &query).await {
            Ok(docs) => docs.len() as u64,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to count unread notifications");
                0
            }
        }
    }
}
