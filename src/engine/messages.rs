//! Append-only message ledger with per-message read state.

use std::sync::Arc;

use uuid::Uuid;

use crate::engine::dispatch::NotificationDispatcher;
use crate::errors::EngineError;
use crate::identity::IdentityResolver;
use crate::models::conversation::ConversationRow;
use crate::models::message::MessageRow;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::store::DataStore;

/// Preview length for the notification body, in characters.
const SNIPPET_LEN: usize = 80;

#[derive(Clone)]
pub struct MessageLedger {
    store: Arc<dyn DataStore>,
    dispatcher: NotificationDispatcher,
    identity: IdentityResolver,
}

impl MessageLedger {
    pub fn new(
        store: Arc<dyn DataStore>,
        dispatcher: NotificationDispatcher,
        identity: IdentityResolver,
    ) -> Self {
        Self {
            store,
            dispatcher,
            identity,
        }
    }

    /// Append a message to a conversation. The insert bumps the
    /// conversation's updated_at in the same write, then a best-effort
    /// `new_message` notification goes to the other participant — the
    /// recipient is never the sender, so self-notification cannot occur
    /// here.
    pub async fn append(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<MessageRow, EngineError> {
        let conversation = self.load(conversation_id).await?;
        if !conversation.is_participant(sender_id) {
            return Err(EngineError::InvalidSender);
        }
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(EngineError::EmptyBody);
        }

        let message = self
            .store
            .insert_message(conversation_id, sender_id, trimmed)
            .await?;

        let recipient = conversation.counterpart_of(sender_id);
        let sender_label = self.identity.label_or(sender_id, "Someone").await;
        self.dispatcher
            .notify_best_effort(NewNotification {
                user_id: recipient,
                kind: NotificationKind::NewMessage,
                title: format!("New message from {}", sender_label),
                body: Some(snippet(trimmed)),
                link: Some(format!("/conversations/{}", conversation_id)),
                related_id: Some(conversation_id),
            })
            .await;

        Ok(message)
    }

    /// Open a conversation: returns its messages newest-first and flips
    /// every incoming unread message to read for the viewer.
    pub async fn view(
        &self,
        conversation_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Vec<MessageRow>, EngineError> {
        let conversation = self.load(conversation_id).await?;
        if !conversation.is_participant(viewer_id) {
            return Err(EngineError::PermissionDenied);
        }
        self.store
            .mark_messages_read(conversation_id, viewer_id)
            .await?;
        let messages = self.store.list_messages(conversation_id).await?;
        Ok(messages)
    }

    /// Flip is_read on every message not sent by `reader_id`. Idempotent:
    /// repeat calls flip nothing further.
    pub async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, EngineError> {
        let conversation = self.load(conversation_id).await?;
        if !conversation.is_participant(reader_id) {
            return Err(EngineError::PermissionDenied);
        }
        let flipped = self
            .store
            .mark_messages_read(conversation_id, reader_id)
            .await?;
        Ok(flipped)
    }

    pub async fn unread_count(
        &self,
        conversation_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<i64, EngineError> {
        let conversation = self.load(conversation_id).await?;
        if !conversation.is_participant(viewer_id) {
            return Err(EngineError::PermissionDenied);
        }
        let count = self
            .store
            .count_unread_messages(conversation_id, viewer_id)
            .await?;
        Ok(count)
    }

    async fn load(&self, conversation_id: Uuid) -> Result<ConversationRow, EngineError> {
        self.store
            .get_conversation(conversation_id)
            .await?
            .ok_or(EngineError::NotFound("conversation"))
    }
}

fn snippet(body: &str) -> String {
    if body.chars().count() <= SNIPPET_LEN {
        body.to_string()
    } else {
        let cut: String = body.chars().take(SNIPPET_LEN).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::snippet;

    #[test]
    fn short_bodies_pass_through() {
        assert_eq!(snippet("hello"), "hello");
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundaries() {
        let long = "ä".repeat(200);
        let s = snippet(&long);
        assert!(s.chars().count() <= 81);
        assert!(s.ends_with('…'));
    }
}
