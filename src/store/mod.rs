use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::conversation::ConversationRow;
use crate::models::message::MessageRow;
use crate::models::notification::{NewNotification, NotificationRow};
use crate::models::user::{ListingRow, UserRow};

pub mod memory;
pub mod postgres;

/// Row-level persistence contract consumed by the engine components.
///
/// Implementations must enforce uniqueness with storage constraints
/// (conversations per (listing, buyer), follows per (store, user),
/// favorites per (listing, user)) — the `insert_*` methods report whether
/// a row was actually inserted instead of erroring on duplicates, so the
/// engine never does read-then-write existence checks.
#[async_trait]
pub trait DataStore: Send + Sync {
    // -- Collaborator lookups (users / stores / listings) --

    async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>>;
    async fn store_owner(&self, store_id: Uuid) -> Result<Option<Uuid>>;
    async fn get_listing(&self, listing_id: Uuid) -> Result<Option<ListingRow>>;

    // -- Conversations --

    /// Insert-or-fetch under the (listing_id, buyer_id) uniqueness
    /// constraint. Concurrent callers both get the same row back.
    async fn find_or_create_conversation(
        &self,
        listing_id: Uuid,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> Result<ConversationRow>;

    async fn get_conversation(&self, id: Uuid) -> Result<Option<ConversationRow>>;

    /// All conversations where the user is buyer or seller, most recently
    /// active first (updated_at desc).
    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationRow>>;

    async fn close_conversation(&self, id: Uuid) -> Result<bool>;

    /// Hard delete; cascades to messages atomically. Returns false when
    /// the conversation did not exist.
    async fn delete_conversation(&self, id: Uuid) -> Result<bool>;

    // -- Messages --

    /// Append a message and bump the parent conversation's updated_at in
    /// one atomic write — a message never lands without the recency bump.
    async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<MessageRow>;

    /// Messages for a conversation, newest first.
    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<MessageRow>>;

    async fn last_message(&self, conversation_id: Uuid) -> Result<Option<MessageRow>>;

    /// Flip is_read on all messages not sent by `reader_id`. Returns the
    /// number of rows flipped (0 on repeat calls — idempotent).
    async fn mark_messages_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64>;

    async fn count_unread_messages(&self, conversation_id: Uuid, viewer_id: Uuid) -> Result<i64>;

    // -- Notifications --

    async fn insert_notification(&self, n: &NewNotification) -> Result<NotificationRow>;
    async fn list_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationRow>>;
    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64>;
    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
    /// Touches only currently-unread rows; returns how many were flipped.
    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64>;

    // -- Follows --

    /// Returns true only on the 0→1 edge (row newly inserted).
    async fn insert_follow(&self, store_id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn delete_follow(&self, store_id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn is_following(&self, store_id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn list_followers(&self, store_id: Uuid) -> Result<Vec<Uuid>>;

    // -- Favorites --

    async fn insert_favorite(&self, listing_id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn delete_favorite(&self, listing_id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn list_favoriters(&self, listing_id: Uuid) -> Result<Vec<Uuid>>;
}
