//! Courier — messaging & notification engine for the marketplace.
//!
//! Owns buyer↔seller conversations, per-message read state, unread
//! aggregation, and the fan-out of notifications triggered by social
//! events (new message, new follower, new listing, new review, price
//! drop). Page rendering, authentication and blob storage are external
//! collaborators.

use std::sync::Arc;

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod identity;
pub mod models;
pub mod store;

use config::Config;
use engine::conversations::Conversations;
use engine::dispatch::NotificationDispatcher;
use engine::messages::MessageLedger;
use engine::triggers::InteractionTriggers;
use engine::unread::UnreadAggregator;
use identity::IdentityResolver;
use store::DataStore;

/// Shared application state passed to handlers.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DataStore>,
    pub identity: IdentityResolver,
    pub conversations: Conversations,
    pub ledger: MessageLedger,
    pub unread: UnreadAggregator,
    pub dispatcher: NotificationDispatcher,
    pub triggers: InteractionTriggers,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, config: Config) -> Self {
        let identity = IdentityResolver::new(store.clone());
        let dispatcher = NotificationDispatcher::new(store.clone());
        let conversations = Conversations::new(store.clone(), identity.clone());
        let ledger = MessageLedger::new(store.clone(), dispatcher.clone(), identity.clone());
        let unread = UnreadAggregator::new(store.clone());
        let triggers =
            InteractionTriggers::new(store.clone(), dispatcher.clone(), identity.clone());
        Self {
            config,
            store,
            identity,
            conversations,
            ledger,
            unread,
            dispatcher,
            triggers,
        }
    }
}
