//! Interaction triggers: the event producers that perform a primary
//! relational write (follow, favorite) or observe a marketplace event
//! (listing published, review posted, price drop) and request
//! notifications as a side effect.
//!
//! Two rules hold everywhere here:
//! - a notification only fires on the 0→1 edge of a relation (duplicate
//!   follow/favorite attempts map to success and fire nothing), and
//! - the actor is never a recipient (self-suppression at the call site,
//!   as the dispatcher itself is actor-agnostic).

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::engine::dispatch::NotificationDispatcher;
use crate::errors::EngineError;
use crate::identity::IdentityResolver;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::user::ListingRow;
use crate::store::DataStore;

#[derive(Clone)]
pub struct InteractionTriggers {
    store: Arc<dyn DataStore>,
    dispatcher: NotificationDispatcher,
    identity: IdentityResolver,
}

#[derive(Debug, Serialize)]
pub struct FollowState {
    pub following: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoriteState {
    pub favorited: bool,
}

/// How many recipients a fan-out event reached.
#[derive(Debug, Serialize)]
pub struct FanOut {
    pub notified: u64,
}

impl InteractionTriggers {
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

    /// Follow a store. Idempotent: a duplicate follow is success-as-
    /// already-following, not an error, and fires no second notification.
    pub async fn follow(&self, store_id: Uuid, user_id: Uuid) -> Result<FollowState, EngineError> {
        let owner_id = self
            .store
            .store_owner(store_id)
            .await?
            .ok_or(EngineError::NotFound("store"))?;

        let inserted = self.store.insert_follow(store_id, user_id).await?;

        if inserted && owner_id != user_id {
            let follower = self.identity.label_or(user_id, "Someone").await;
            self.dispatcher
                .notify_best_effort(NewNotification {
                    user_id: owner_id,
                    kind: NotificationKind::NewFollower,
                    title: format!("{} started following your store", follower),
                    body: None,
                    link: Some(format!("/stores/{}", store_id)),
                    related_id: Some(store_id),
                })
                .await;
        }

        Ok(FollowState { following: true })
    }

    /// Unfollow. Removing a follow never retracts past notifications.
    pub async fn unfollow(
        &self,
        store_id: Uuid,
        user_id: Uuid,
    ) -> Result<FollowState, EngineError> {
        self.store.delete_follow(store_id, user_id).await?;
        Ok(FollowState { following: false })
    }

    /// Favorite a listing. No immediate notification — favorites only
    /// select the recipients of later price-drop events.
    pub async fn favorite(
        &self,
        listing_id: Uuid,
        user_id: Uuid,
    ) -> Result<FavoriteState, EngineError> {
        self.load_listing(listing_id).await?;
        self.store.insert_favorite(listing_id, user_id).await?;
        Ok(FavoriteState { favorited: true })
    }

    pub async fn unfavorite(
        &self,
        listing_id: Uuid,
        user_id: Uuid,
    ) -> Result<FavoriteState, EngineError> {
        self.store.delete_favorite(listing_id, user_id).await?;
        Ok(FavoriteState { favorited: false })
    }

    /// Fan a `new_listing` notification out to every follower of the
    /// listing's store, except the actor who published it.
    pub async fn listing_published(
        &self,
        listing_id: Uuid,
        actor_id: Uuid,
    ) -> Result<FanOut, EngineError> {
        let listing = self.load_listing(listing_id).await?;
        let followers = self.store.list_followers(listing.store_id).await?;

        let mut notified = 0;
        for follower in followers {
            if follower == actor_id {
                continue;
            }
            self.dispatcher
                .notify_best_effort(NewNotification {
                    user_id: follower,
                    kind: NotificationKind::NewListing,
                    title: format!("New listing: {}", listing.title),
                    body: None,
                    link: Some(format!("/listings/{}", listing_id)),
                    related_id: Some(listing_id),
                })
                .await;
            notified += 1;
        }
        Ok(FanOut { notified })
    }

    /// Notify the seller that someone reviewed their listing. Reviewing
    /// your own listing notifies no one.
    pub async fn review_posted(
        &self,
        listing_id: Uuid,
        reviewer_id: Uuid,
        rating: Option<i16>,
    ) -> Result<FanOut, EngineError> {
        let listing = self.load_listing(listing_id).await?;
        if listing.seller_id == reviewer_id {
            return Ok(FanOut { notified: 0 });
        }

        let reviewer = self.identity.label_or(reviewer_id, "Someone").await;
        self.dispatcher
            .notify_best_effort(NewNotification {
                user_id: listing.seller_id,
                kind: NotificationKind::NewReview,
                title: format!("{} reviewed {}", reviewer, listing.title),
                body: rating.map(|r| format!("{} out of 5", r)),
                link: Some(format!("/listings/{}", listing_id)),
                related_id: Some(listing_id),
            })
            .await;
        Ok(FanOut { notified: 1 })
    }

    /// Fan a `price_drop` notification out to everyone who favorited the
    /// listing, except the actor. A non-drop (new >= old) fires nothing.
    pub async fn price_dropped(
        &self,
        listing_id: Uuid,
        old_price_cents: i64,
        new_price_cents: i64,
        actor_id: Uuid,
    ) -> Result<FanOut, EngineError> {
        if new_price_cents >= old_price_cents {
            return Ok(FanOut { notified: 0 });
        }
        let listing = self.load_listing(listing_id).await?;
        let favoriters = self.store.list_favoriters(listing_id).await?;

        let mut notified = 0;
        for favoriter in favoriters {
            if favoriter == actor_id {
                continue;
            }
            self.dispatcher
                .notify_best_effort(NewNotification {
                    user_id: favoriter,
                    kind: NotificationKind::PriceDrop,
                    title: format!("Price drop: {}", listing.title),
                    body: Some(format!(
                        "Now {} (was {})",
                        format_cents(new_price_cents),
                        format_cents(old_price_cents)
                    )),
                    link: Some(format!("/listings/{}", listing_id)),
                    related_id: Some(listing_id),
                })
                .await;
            notified += 1;
        }
        Ok(FanOut { notified })
    }

    async fn load_listing(&self, listing_id: Uuid) -> Result<ListingRow, EngineError> {
        self.store
            .get_listing(listing_id)
            .await?
            .ok_or(EngineError::NotFound("listing"))
    }
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::format_cents;

    #[test]
    fn formats_whole_and_fractional_amounts() {
        assert_eq!(format_cents(1500), "$15.00");
        assert_eq!(format_cents(99), "$0.99");
        assert_eq!(format_cents(120005), "$1200.05");
    }

    #[test]
    fn negative_amounts_carry_a_single_leading_sign() {
        assert_eq!(format_cents(-150), "-$1.50");
        assert_eq!(format_cents(-5), "-$0.05");
    }
}
