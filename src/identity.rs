//! Identity resolution and the request-level auth gate.
//!
//! Courier does not authenticate anyone itself; the external auth provider
//! (or the reverse proxy fronting it) asserts the caller's id in the
//! `x-user-id` header. The extractor verifies the id refers to a known
//! user and rejects everything else with `Unauthenticated`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::user::Identity;
use crate::store::DataStore;
use crate::AppState;

pub const USER_HEADER: &str = "x-user-id";

/// Maps opaque user ids to display identity (name, email fallback).
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn DataStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, user_id: Uuid) -> Result<Identity, EngineError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(EngineError::NotFound("user"))?;
        Ok(user.into())
    }

    /// Display label for notification titles. Resolution failures fall
    /// back to a generic label rather than failing the caller.
    pub async fn label_or(&self, user_id: Uuid, fallback: &str) -> String {
        match self.resolve(user_id).await {
            Ok(ident) => ident.label().to_string(),
            Err(e) => {
                tracing::warn!(user_id = %user_id, "identity resolution failed: {}", e);
                fallback.to_string()
            }
        }
    }
}

/// Extractor for the authenticated caller. Mutating routes take this as
/// their first argument; a missing or unknown id is a 401.
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = EngineError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(EngineError::Unauthenticated)?;
        let id = Uuid::parse_str(raw).map_err(|_| EngineError::Unauthenticated)?;
        let user = state
            .store
            .get_user(id)
            .await?
            .ok_or(EngineError::Unauthenticated)?;
        Ok(CurrentUser(user.into()))
    }
}
