//! Conversation lifecycle: find-or-create, inbox listing, close, delete.

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::EngineError;
use crate::identity::IdentityResolver;
use crate::models::conversation::{ConversationRow, ConversationSummary};
use crate::store::DataStore;

#[derive(Clone)]
pub struct Conversations {
    store: Arc<dyn DataStore>,
    identity: IdentityResolver,
}

impl Conversations {
    pub fn new(store: Arc<dyn DataStore>, identity: IdentityResolver) -> Self {
        Self { store, identity }
    }

    /// Look up the thread for (listing, buyer), creating it when absent.
    /// Uniqueness is guaranteed by the storage constraint, so two
    /// concurrent first-message sends converge on the same conversation.
    pub async fn find_or_create(
        &self,
        listing_id: Uuid,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> Result<ConversationRow, EngineError> {
        if buyer_id == seller_id {
            return Err(EngineError::InvalidSender);
        }
        let row = self
            .store
            .find_or_create_conversation(listing_id, buyer_id, seller_id)
            .await?;
        Ok(row)
    }

    /// Inbox view: every conversation the user participates in, enriched
    /// with the counterpart's identity, the latest message and the user's
    /// unread count. Ordered by updated_at descending — recency of
    /// activity, not recency of creation.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, EngineError> {
        let rows = self.store.list_conversations(user_id).await?;
        let mut summaries = Vec::with_capacity(rows.len());
        for conversation in rows {
            let counterpart = self
                .identity
                .resolve(conversation.counterpart_of(user_id))
                .await?;
            let last_message = self.store.last_message(conversation.id).await?;
            let unread_count = self
                .store
                .count_unread_messages(conversation.id, user_id)
                .await?;
            summaries.push(ConversationSummary {
                conversation,
                counterpart,
                last_message,
                unread_count,
            });
        }
        Ok(summaries)
    }

    /// Participant-gated status flip to `closed`.
    pub async fn close(&self, conversation_id: Uuid, acting_user: Uuid) -> Result<(), EngineError> {
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .ok_or(EngineError::NotFound("conversation"))?;
        if !conversation.is_participant(acting_user) {
            return Err(EngineError::PermissionDenied);
        }
        self.store.close_conversation(conversation_id).await?;
        Ok(())
    }

    /// Hard delete, cascading to all messages. Unilateral: either
    /// participant may destroy the thread, and there is no undo.
    pub async fn delete(&self, conversation_id: Uuid, acting_user: Uuid) -> Result<(), EngineError> {
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .ok_or(EngineError::NotFound("conversation"))?;
        if !conversation.is_participant(acting_user) {
            return Err(EngineError::PermissionDenied);
        }
        self.store.delete_conversation(conversation_id).await?;
        Ok(())
    }
}
