use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Domain error taxonomy for the messaging engine.
///
/// `AlreadyExists` is almost never surfaced: follow/favorite paths swallow
/// it and map duplicates to success, since the UI cannot distinguish "just
/// followed" from "double-clicked follow".
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("permission denied")]
    PermissionDenied,

    #[error("sender is not a participant in this conversation")]
    InvalidSender,

    #[error("message body is empty")]
    EmptyBody,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("already exists")]
    AlreadyExists,

    #[error("store unavailable: {0}")]
    Transient(#[from] anyhow::Error),
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            EngineError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "unauthenticated",
                "missing or unknown user identity".to_string(),
            ),
            EngineError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "permission_denied",
                "you are not a participant of this resource".to_string(),
            ),
            EngineError::InvalidSender => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request_error",
                "invalid_sender",
                "sender is not a participant in this conversation".to_string(),
            ),
            EngineError::EmptyBody => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request_error",
                "empty_body",
                "message body must not be blank".to_string(),
            ),
            EngineError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "not_found",
                format!("{} not found", what),
            ),
            EngineError::AlreadyExists => (
                StatusCode::CONFLICT,
                "invalid_request_error",
                "already_exists",
                "resource already exists".to_string(),
            ),
            EngineError::Transient(e) => {
                tracing::error!("store error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "internal_error",
                    "store_unavailable",
                    "storage temporarily unavailable".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn unauthenticated_maps_to_401() {
        let resp = EngineError::Unauthenticated.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn permission_denied_maps_to_403() {
        let resp = EngineError::PermissionDenied.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = EngineError::NotFound("conversation");
        assert_eq!(err.to_string(), "conversation not found");
    }

    #[test]
    fn transient_maps_to_503() {
        let resp = EngineError::Transient(anyhow::anyhow!("pool closed")).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
