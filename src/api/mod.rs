use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};

use crate::AppState;

pub mod handlers;

/// Build the engine API router.
/// All routes are relative — the caller mounts this under `/api/v1`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Conversations & messages
        .route(
            "/conversations",
            get(handlers::list_conversations).post(handlers::create_conversation),
        )
        .route("/conversations/:id", delete(handlers::delete_conversation))
        .route(
            "/conversations/:id/messages",
            get(handlers::view_messages).post(handlers::send_message),
        )
        .route("/conversations/:id/read", post(handlers::mark_conversation_read))
        .route("/conversations/:id/close", post(handlers::close_conversation))
        .route("/inbox/unread", get(handlers::inbox_badge))
        // Notifications
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/unread",
            get(handlers::count_unread_notifications),
        )
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
        .route(
            "/notifications/read-all",
            post(handlers::mark_all_notifications_read),
        )
        // Interaction triggers
        .route(
            "/stores/:id/follow",
            post(handlers::follow_store).delete(handlers::unfollow_store),
        )
        .route(
            "/listings/:id/favorite",
            post(handlers::favorite_listing).delete(handlers::unfavorite_listing),
        )
        // Marketplace events (the main app calls these on its own writes)
        .route("/events/listing-published", post(handlers::listing_published))
        .route("/events/review", post(handlers::review_posted))
        .route("/events/price-drop", post(handlers::price_dropped))
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}
