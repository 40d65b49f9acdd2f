use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::message::MessageRow;
use crate::models::user::Identity;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Closed,
}

/// A buyer↔seller thread anchored to a single listing.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ConversationRow {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationRow {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        user_id == self.buyer_id || user_id == self.seller_id
    }

    /// The participant on the other side of the thread from `user_id`.
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if user_id == self.buyer_id {
            self.seller_id
        } else {
            self.buyer_id
        }
    }
}

/// Inbox-list view: a conversation enriched with who the other participant
/// is, the latest message, and the viewer's unread count.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: ConversationRow,
    pub counterpart: Identity,
    pub last_message: Option<MessageRow>,
    pub unread_count: i64,
}
