//! Unread aggregation: derived state only, recomputed on every call.
//!
//! Nothing here is cached — the other participant can flip ledger state
//! at any time, so the badge is recomputed from the message ledger on
//! every inbox open (poll-on-open, not push).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::store::DataStore;

#[derive(Clone)]
pub struct UnreadAggregator {
    store: Arc<dyn DataStore>,
}

#[derive(Debug, Serialize)]
pub struct UnreadConversation {
    pub conversation_id: Uuid,
    pub listing_id: Uuid,
    pub unread_count: i64,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// The global unread badge plus the conversations that contribute to it.
#[derive(Debug, Serialize)]
pub struct InboxBadge {
    pub total: i64,
    pub conversations: Vec<UnreadConversation>,
}

impl UnreadAggregator {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Global unread count for the user and the list of conversations
    /// with unread > 0, ordered by unread count descending; ties broken
    /// by most recent message timestamp.
    pub async fn badge(&self, user_id: Uuid) -> Result<InboxBadge, EngineError> {
        let conversations = self.store.list_conversations(user_id).await?;

        let mut total = 0;
        let mut entries = Vec::new();
        for conversation in conversations {
            let unread_count = self
                .store
                .count_unread_messages(conversation.id, user_id)
                .await?;
            total += unread_count;
            if unread_count == 0 {
                continue;
            }
            let last_message_at = self
                .store
                .last_message(conversation.id)
                .await?
                .map(|m| m.created_at);
            entries.push(UnreadConversation {
                conversation_id: conversation.id,
                listing_id: conversation.listing_id,
                unread_count,
                last_message_at,
            });
        }

        entries.sort_by(|a, b| {
            b.unread_count
                .cmp(&a.unread_count)
                .then(b.last_message_at.cmp(&a.last_message_at))
        });

        Ok(InboxBadge {
            total,
            conversations: entries,
        })
    }
}
