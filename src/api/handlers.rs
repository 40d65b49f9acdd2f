use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::engine::dispatch::MarkAllOutcome;
use crate::engine::triggers::{FanOut, FavoriteState, FollowState};
use crate::engine::unread::InboxBadge;
use crate::errors::EngineError;
use crate::identity::CurrentUser;
use crate::models::conversation::{ConversationRow, ConversationSummary};
use crate::models::message::MessageRow;
use crate::models::notification::NotificationRow;
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    pub listing_id: Uuid,
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct ListingEventRequest {
    pub listing_id: Uuid,
}

#[derive(Deserialize)]
pub struct ReviewEventRequest {
    pub listing_id: Uuid,
    pub rating: Option<i16>,
}

#[derive(Deserialize)]
pub struct PriceDropEventRequest {
    pub listing_id: Uuid,
    pub old_price_cents: i64,
    pub new_price_cents: i64,
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

// ── Conversations ────────────────────────────────────────────

/// POST /api/v1/conversations — find-or-create the caller's thread for a
/// listing. The seller is resolved from the listing, never trusted from
/// the request.
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationRow>), EngineError> {
    let listing = state
        .store
        .get_listing(payload.listing_id)
        .await?
        .ok_or(EngineError::NotFound("listing"))?;
    let conversation = state
        .conversations
        .find_or_create(listing.id, user.id, listing.seller_id)
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /api/v1/conversations — the caller's inbox, most recently active
/// first, enriched with counterpart identity, last message, unread count.
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ConversationSummary>>, EngineError> {
    let summaries = state.conversations.list_for_user(user.id).await?;
    Ok(Json(summaries))
}

/// DELETE /api/v1/conversations/:id — participant-only hard delete,
/// cascading to all messages.
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, EngineError> {
    state.conversations.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/conversations/:id/close
pub async fn close_conversation(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, EngineError> {
    state.conversations.close(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Messages ─────────────────────────────────────────────────

/// GET /api/v1/conversations/:id/messages — open the thread: returns the
/// messages newest-first and marks incoming messages read for the caller.
pub async fn view_messages(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageRow>>, EngineError> {
    let messages = state.ledger.view(id, user.id).await?;
    Ok(Json(messages))
}

/// POST /api/v1/conversations/:id/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageRow>), EngineError> {
    let message = state.ledger.append(id, user.id, &payload.body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/v1/conversations/:id/read — explicit mark-read (idempotent).
pub async fn mark_conversation_read(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MarkReadResponse>, EngineError> {
    let updated = state.ledger.mark_read(id, user.id).await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// GET /api/v1/inbox/unread — the global badge, recomputed on every call.
pub async fn inbox_badge(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<InboxBadge>, EngineError> {
    let badge = state.unread.badge(user.id).await?;
    Ok(Json(badge))
}

// ── Notifications ────────────────────────────────────────────

/// GET /api/v1/notifications — newest first. Without params this returns
/// the bell dropdown page; the history view paginates with limit/offset.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<NotificationRow>>, EngineError> {
    let limit = params
        .limit
        .unwrap_or(state.config.bell_limit)
        .clamp(1, state.config.page_size);
    let offset = params.offset.unwrap_or(0).max(0);
    let rows = state.dispatcher.list(user.id, limit, offset).await?;
    Ok(Json(rows))
}

/// GET /api/v1/notifications/unread
pub async fn count_unread_notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, EngineError> {
    let unread = state.dispatcher.unread_count(user.id).await?;
    Ok(Json(json!({ "unread": unread })))
}

/// POST /api/v1/notifications/:id/read
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, EngineError> {
    state.dispatcher.mark_read(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all — reports the new unread count so
/// the UI can reset its badge without a second round trip.
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MarkAllOutcome>, EngineError> {
    let outcome = state.dispatcher.mark_all_read(user.id).await?;
    Ok(Json(outcome))
}

// ── Interaction triggers ─────────────────────────────────────

/// POST /api/v1/stores/:id/follow — idempotent; double-follow is success.
pub async fn follow_store(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowState>, EngineError> {
    let outcome = state.triggers.follow(id, user.id).await?;
    Ok(Json(outcome))
}

/// DELETE /api/v1/stores/:id/follow
pub async fn unfollow_store(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowState>, EngineError> {
    let outcome = state.triggers.unfollow(id, user.id).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/listings/:id/favorite
pub async fn favorite_listing(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FavoriteState>, EngineError> {
    let outcome = state.triggers.favorite(id, user.id).await?;
    Ok(Json(outcome))
}

/// DELETE /api/v1/listings/:id/favorite
pub async fn unfavorite_listing(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FavoriteState>, EngineError> {
    let outcome = state.triggers.unfavorite(id, user.id).await?;
    Ok(Json(outcome))
}

// ── Marketplace events ───────────────────────────────────────

/// POST /api/v1/events/listing-published — fan out to store followers.
pub async fn listing_published(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ListingEventRequest>,
) -> Result<Json<FanOut>, EngineError> {
    let outcome = state
        .triggers
        .listing_published(payload.listing_id, user.id)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/events/review — notify the seller.
pub async fn review_posted(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ReviewEventRequest>,
) -> Result<Json<FanOut>, EngineError> {
    let outcome = state
        .triggers
        .review_posted(payload.listing_id, user.id, payload.rating)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/events/price-drop — fan out to favoriters.
pub async fn price_dropped(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PriceDropEventRequest>,
) -> Result<Json<FanOut>, EngineError> {
    let outcome = state
        .triggers
        .price_dropped(
            payload.listing_id,
            payload.old_price_cents,
            payload.new_price_cents,
            user.id,
        )
        .await?;
    Ok(Json(outcome))
}
