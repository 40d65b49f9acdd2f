use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::conversation::ConversationRow;
use crate::models::message::MessageRow;
use crate::models::notification::{NewNotification, NotificationRow};
use crate::models::user::{ListingRow, UserRow};
use crate::store::DataStore;

const CONVERSATION_COLS: &str =
    "id, listing_id, buyer_id, seller_id, status, created_at, updated_at";
const MESSAGE_COLS: &str = "id, conversation_id, sender_id, body, is_read, created_at";
const NOTIFICATION_COLS: &str =
    "id, user_id, kind, title, body, link, related_id, is_read, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DataStore for PgStore {
    // -- Collaborator lookups --

    async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, display_name, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn store_owner(&self, store_id: Uuid) -> Result<Option<Uuid>> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM stores WHERE id = $1")
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn get_listing(&self, listing_id: Uuid) -> Result<Option<ListingRow>> {
        let row = sqlx::query_as::<_, ListingRow>(
            "SELECT id, store_id, seller_id, title, price_cents FROM listings WHERE id = $1",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // -- Conversations --

    async fn find_or_create_conversation(
        &self,
        listing_id: Uuid,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> Result<ConversationRow> {
        // Optimistic insert; on conflict the existing thread wins.
        let inserted = sqlx::query_as::<_, ConversationRow>(&format!(
            r#"INSERT INTO conversations (listing_id, buyer_id, seller_id)
               VALUES ($1, $2, $3)
               ON CONFLICT (listing_id, buyer_id) DO NOTHING
               RETURNING {CONVERSATION_COLS}"#
        ))
        .bind(listing_id)
        .bind(buyer_id)
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row);
        }

        let existing = sqlx::query_as::<_, ConversationRow>(&format!(
            "SELECT {CONVERSATION_COLS} FROM conversations WHERE listing_id = $1 AND buyer_id = $2"
        ))
        .bind(listing_id)
        .bind(buyer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(existing)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<ConversationRow>> {
        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            "SELECT {CONVERSATION_COLS} FROM conversations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationRow>> {
        let rows = sqlx::query_as::<_, ConversationRow>(&format!(
            r#"SELECT {CONVERSATION_COLS} FROM conversations
               WHERE buyer_id = $1 OR seller_id = $1
               ORDER BY updated_at DESC"#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn close_conversation(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE conversations SET status = 'closed' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        // Messages go with it via ON DELETE CASCADE; a single statement
        // keeps the cascade atomic.
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Messages --

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<MessageRow> {
        // Single statement: the insert and the parent's recency bump
        // commit together or not at all.
        let row = sqlx::query_as::<_, MessageRow>(
            r#"WITH m AS (
                   INSERT INTO messages (conversation_id, sender_id, body)
                   VALUES ($1, $2, $3)
                   RETURNING id, conversation_id, sender_id, body, is_read, created_at
               )
               UPDATE conversations c SET updated_at = NOW()
               FROM m WHERE c.id = m.conversation_id
               RETURNING m.id, m.conversation_id, m.sender_id, m.body,
                         m.is_read, m.created_at"#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<MessageRow>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"SELECT {MESSAGE_COLS} FROM messages
               WHERE conversation_id = $1
               ORDER BY created_at DESC"#
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn last_message(&self, conversation_id: Uuid) -> Result<Option<MessageRow>> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"SELECT {MESSAGE_COLS} FROM messages
               WHERE conversation_id = $1
               ORDER BY created_at DESC
               LIMIT 1"#
        ))
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_messages_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"UPDATE messages SET is_read = TRUE
               WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = FALSE"#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_unread_messages(&self, conversation_id: Uuid, viewer_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM messages
               WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = FALSE"#,
        )
        .bind(conversation_id)
        .bind(viewer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // -- Notifications --

    async fn insert_notification(&self, n: &NewNotification) -> Result<NotificationRow> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"INSERT INTO notifications (user_id, kind, title, body, link, related_id)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {NOTIFICATION_COLS}"#
        ))
        .bind(n.user_id)
        .bind(n.kind)
        .bind(&n.title)
        .bind(&n.body)
        .bind(&n.link)
        .bind(n.related_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationRow>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"SELECT {NOTIFICATION_COLS} FROM notifications
               WHERE user_id = $1
               ORDER BY created_at DESC
               LIMIT $2 OFFSET $3"#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -- Follows --

    async fn insert_follow(&self, store_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"INSERT INTO follows (store_id, user_id) VALUES ($1, $2)
               ON CONFLICT (store_id, user_id) DO NOTHING"#,
        )
        .bind(store_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, store_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE store_id = $1 AND user_id = $2")
            .bind(store_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_following(&self, store_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE store_id = $1 AND user_id = $2)",
        )
        .bind(store_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_followers(&self, store_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM follows WHERE store_id = $1 ORDER BY created_at ASC",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -- Favorites --

    async fn insert_favorite(&self, listing_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"INSERT INTO favorites (listing_id, user_id) VALUES ($1, $2)
               ON CONFLICT (listing_id, user_id) DO NOTHING"#,
        )
        .bind(listing_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_favorite(&self, listing_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE listing_id = $1 AND user_id = $2")
            .bind(listing_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_favoriters(&self, listing_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM favorites WHERE listing_id = $1 ORDER BY created_at ASC",
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
