//! Notification dispatcher: create, list, and mark notifications read.
//!
//! The dispatcher is actor-agnostic — it only ever knows the recipient.
//! Self-notification suppression (actor == recipient) is the caller's
//! responsibility, enforced at the trigger call sites.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::notification::{NewNotification, NotificationRow};
use crate::store::DataStore;

#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn DataStore>,
}

/// Result of a mark-all sweep. `unread` is reported back so the UI can
/// reset its badge without a second round trip.
#[derive(Debug, Serialize)]
pub struct MarkAllOutcome {
    pub updated: u64,
    pub unread: i64,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn notify(&self, n: NewNotification) -> Result<NotificationRow, EngineError> {
        let row = self.store.insert_notification(&n).await?;
        tracing::debug!(
            recipient = %row.user_id,
            kind = ?row.kind,
            "notification created"
        );
        Ok(row)
    }

    /// Fire-and-forget insert for trigger side effects. Notifications are
    /// an advisory side channel: a failure here is logged and dropped,
    /// never propagated to the primary action.
    pub async fn notify_best_effort(&self, n: NewNotification) {
        let recipient = n.user_id;
        let kind = n.kind;
        if let Err(e) = self.notify(n).await {
            tracing::warn!(
                recipient = %recipient,
                kind = ?kind,
                "notification dropped: {}",
                e
            );
        }
    }

    /// Newest-first page of a user's notifications. The bell dropdown
    /// uses a small limit with offset 0; the history view paginates.
    pub async fn list(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationRow>, EngineError> {
        let rows = self.store.list_notifications(user_id, limit, offset).await?;
        Ok(rows)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, EngineError> {
        let count = self.store.count_unread_notifications(user_id).await?;
        Ok(count)
    }

    /// Monotonic is_read flip for a single notification owned by `user_id`.
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<(), EngineError> {
        let updated = self.store.mark_notification_read(id, user_id).await?;
        if !updated {
            return Err(EngineError::NotFound("notification"));
        }
        Ok(())
    }

    /// Flip every unread notification for the user; only touches
    /// currently-unread rows.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<MarkAllOutcome, EngineError> {
        let updated = self.store.mark_all_notifications_read(user_id).await?;
        let unread = self.store.count_unread_notifications(user_id).await?;
        Ok(MarkAllOutcome { updated, unread })
    }
}
