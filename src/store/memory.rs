//! In-memory `DataStore` used by the test suite and the
//! `COURIER_MEMORY_STORE` development mode. Mirrors the Postgres
//! constraints (pair uniqueness, cascade delete) without a database.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::conversation::{ConversationRow, ConversationStatus};
use crate::models::message::MessageRow;
use crate::models::notification::{NewNotification, NotificationRow};
use crate::models::user::{ListingRow, UserRow};
use crate::store::DataStore;

#[derive(Default)]
struct Inner {
    users: Vec<UserRow>,
    stores: Vec<(Uuid, Uuid)>, // (store_id, owner_id)
    listings: Vec<ListingRow>,
    conversations: Vec<ConversationRow>,
    messages: Vec<MessageRow>,
    notifications: Vec<NotificationRow>,
    follows: Vec<(Uuid, Uuid, DateTime<Utc>)>, // (store_id, user_id, created_at)
    favorites: Vec<(Uuid, Uuid, DateTime<Utc>)>, // (listing_id, user_id, created_at)
}

pub struct MemStore {
    inner: Mutex<Inner>,
    // Logical clock: each timestamp is strictly later than the previous
    // one, so created_at ordering is deterministic in tests.
    seq: AtomicI64,
    epoch: DateTime<Utc>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            seq: AtomicI64::new(0),
            epoch: Utc::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let tick = self.seq.fetch_add(1, Ordering::SeqCst);
        self.epoch + Duration::microseconds(tick)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -- Seed helpers (collaborator rows the marketplace app would own) --

    pub fn seed_user(&self, email: &str, display_name: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().users.push(UserRow {
            id,
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
            created_at: self.now(),
        });
        id
    }

    pub fn seed_store(&self, owner_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().stores.push((id, owner_id));
        id
    }

    pub fn seed_listing(
        &self,
        store_id: Uuid,
        seller_id: Uuid,
        title: &str,
        price_cents: i64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().listings.push(ListingRow {
            id,
            store_id,
            seller_id,
            title: title.to_string(),
            price_cents,
        });
        id
    }
}

#[async_trait]
impl DataStore for MemStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn store_owner(&self, store_id: Uuid) -> Result<Option<Uuid>> {
        Ok(self
            .lock()
            .stores
            .iter()
            .find(|(id, _)| *id == store_id)
            .map(|(_, owner)| *owner))
    }

    async fn get_listing(&self, listing_id: Uuid) -> Result<Option<ListingRow>> {
        Ok(self
            .lock()
            .listings
            .iter()
            .find(|l| l.id == listing_id)
            .cloned())
    }

    async fn find_or_create_conversation(
        &self,
        listing_id: Uuid,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> Result<ConversationRow> {
        let now = self.now();
        let mut inner = self.lock();
        if let Some(existing) = inner
            .conversations
            .iter()
            .find(|c| c.listing_id == listing_id && c.buyer_id == buyer_id)
        {
            return Ok(existing.clone());
        }
        let row = ConversationRow {
            id: Uuid::new_v4(),
            listing_id,
            buyer_id,
            seller_id,
            status: ConversationStatus::Active,
            created_at: now,
            updated_at: now,
        };
        inner.conversations.push(row.clone());
        Ok(row)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<ConversationRow>> {
        Ok(self
            .lock()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationRow>> {
        let mut rows: Vec<ConversationRow> = self
            .lock()
            .conversations
            .iter()
            .filter(|c| c.buyer_id == user_id || c.seller_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn close_conversation(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.lock();
        match inner.conversations.iter_mut().find(|c| c.id == id) {
            Some(c) => {
                c.status = ConversationStatus::Closed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.lock();
        let before = inner.conversations.len();
        inner.conversations.retain(|c| c.id != id);
        if inner.conversations.len() == before {
            return Ok(false);
        }
        // Cascade under the same lock: conversation and messages disappear
        // together, never one without the other.
        inner.messages.retain(|m| m.conversation_id != id);
        Ok(true)
    }

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<MessageRow> {
        let now = self.now();
        let row = MessageRow {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            body: body.to_string(),
            is_read: false,
            created_at: now,
        };
        // One lock: the message and the parent's recency bump land
        // together.
        let mut inner = self.lock();
        if let Some(c) = inner
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            c.updated_at = now;
        }
        inner.messages.push(row.clone());
        Ok(row)
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<MessageRow>> {
        let mut rows: Vec<MessageRow> = self
            .lock()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn last_message(&self, conversation_id: Uuid) -> Result<Option<MessageRow>> {
        Ok(self
            .lock()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn mark_messages_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64> {
        let mut flipped = 0;
        for m in self.lock().messages.iter_mut() {
            if m.conversation_id == conversation_id && m.sender_id != reader_id && !m.is_read {
                m.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn count_unread_messages(&self, conversation_id: Uuid, viewer_id: Uuid) -> Result<i64> {
        Ok(self
            .lock()
            .messages
            .iter()
            .filter(|m| {
                m.conversation_id == conversation_id && m.sender_id != viewer_id && !m.is_read
            })
            .count() as i64)
    }

    async fn insert_notification(&self, n: &NewNotification) -> Result<NotificationRow> {
        let row = NotificationRow {
            id: Uuid::new_v4(),
            user_id: n.user_id,
            kind: n.kind,
            title: n.title.clone(),
            body: n.body.clone(),
            link: n.link.clone(),
            related_id: n.related_id,
            is_read: false,
            created_at: self.now(),
        };
        self.lock().notifications.push(row.clone());
        Ok(row)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationRow>> {
        let mut rows: Vec<NotificationRow> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut inner = self.lock();
        match inner
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64> {
        let mut flipped = 0;
        for n in self.lock().notifications.iter_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn insert_follow(&self, store_id: Uuid, user_id: Uuid) -> Result<bool> {
        let now = self.now();
        let mut inner = self.lock();
        if inner
            .follows
            .iter()
            .any(|(s, u, _)| *s == store_id && *u == user_id)
        {
            return Ok(false);
        }
        inner.follows.push((store_id, user_id, now));
        Ok(true)
    }

    async fn delete_follow(&self, store_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut inner = self.lock();
        let before = inner.follows.len();
        inner
            .follows
            .retain(|(s, u, _)| !(*s == store_id && *u == user_id));
        Ok(inner.follows.len() != before)
    }

    async fn is_following(&self, store_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self
            .lock()
            .follows
            .iter()
            .any(|(s, u, _)| *s == store_id && *u == user_id))
    }

    async fn list_followers(&self, store_id: Uuid) -> Result<Vec<Uuid>> {
        let mut rows: Vec<(Uuid, DateTime<Utc>)> = self
            .lock()
            .follows
            .iter()
            .filter(|(s, _, _)| *s == store_id)
            .map(|(_, u, at)| (*u, *at))
            .collect();
        rows.sort_by_key(|(_, at)| *at);
        Ok(rows.into_iter().map(|(u, _)| u).collect())
    }

    async fn insert_favorite(&self, listing_id: Uuid, user_id: Uuid) -> Result<bool> {
        let now = self.now();
        let mut inner = self.lock();
        if inner
            .favorites
            .iter()
            .any(|(l, u, _)| *l == listing_id && *u == user_id)
        {
            return Ok(false);
        }
        inner.favorites.push((listing_id, user_id, now));
        Ok(true)
    }

    async fn delete_favorite(&self, listing_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut inner = self.lock();
        let before = inner.favorites.len();
        inner
            .favorites
            .retain(|(l, u, _)| !(*l == listing_id && *u == user_id));
        Ok(inner.favorites.len() != before)
    }

    async fn list_favoriters(&self, listing_id: Uuid) -> Result<Vec<Uuid>> {
        let mut rows: Vec<(Uuid, DateTime<Utc>)> = self
            .lock()
            .favorites
            .iter()
            .filter(|(l, _, _)| *l == listing_id)
            .map(|(_, u, at)| (*u, *at))
            .collect();
        rows.sort_by_key(|(_, at)| *at);
        Ok(rows.into_iter().map(|(u, _)| u).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_or_create_is_unique_per_listing_buyer() {
        let store = MemStore::new();
        let buyer = store.seed_user("b@example.com", None);
        let seller = store.seed_user("s@example.com", None);
        let shop = store.seed_store(seller);
        let listing = store.seed_listing(shop, seller, "Lamp", 1500);

        let a = store
            .find_or_create_conversation(listing, buyer, seller)
            .await
            .unwrap();
        let b = store
            .find_or_create_conversation(listing, buyer, seller)
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn delete_cascades_messages() {
        let store = MemStore::new();
        let buyer = store.seed_user("b@example.com", None);
        let seller = store.seed_user("s@example.com", None);
        let shop = store.seed_store(seller);
        let listing = store.seed_listing(shop, seller, "Lamp", 1500);
        let conv = store
            .find_or_create_conversation(listing, buyer, seller)
            .await
            .unwrap();
        store.insert_message(conv.id, buyer, "hi").await.unwrap();

        assert!(store.delete_conversation(conv.id).await.unwrap());
        assert!(store.list_messages(conv.id).await.unwrap().is_empty());
        assert!(!store.delete_conversation(conv.id).await.unwrap());
    }

    #[tokio::test]
    async fn timestamps_strictly_increase() {
        let store = MemStore::new();
        let a = store.now();
        let b = store.now();
        assert!(b > a);
    }
}
