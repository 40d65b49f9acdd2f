use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single utterance within a conversation. Append-only; `is_read` is the
/// only field that ever changes, and only false→true.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
