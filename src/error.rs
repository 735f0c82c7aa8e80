//! Typed API errors and their JSON envelope.
//!
//! Every handler returns `Result<HttpResponse, ApiError>`; the
//! `ResponseError` impl renders the `{status: "error", message, ...}`
//! envelope the clients expect. Store errors keep their raw text in the
//! body — this is an internal tool, not a hardened public API.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input → 400.
    #[error("{0}")]
    Validation(String),

    /// Invariant violation (duplicate room code, player already in an
    /// active game) → 400, optionally carrying the conflicting room code.
    #[error("{message}")]
    Conflict {
        message: String,
        active_room: Option<String>,
    },

    /// No matching row → 404.
    #[error("{0}")]
    NotFound(String),

    /// Store connectivity or query failure → 500.
    #[error("database error")]
    Store(#[from] sqlx::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: msg.into(),
            active_room: None,
        }
    }

    /// Conflict for a player who already has a live room; the room code is
    /// surfaced so the client can send them back to it.
    pub fn already_active(room_code: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: "You are already in an active game. Please retry later; \
                      if the problem persists, contact support from the main menu"
                .into(),
            active_room: Some(room_code.into()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "status": "error",
            "message": self.to_string(),
        });

        match self {
            ApiError::Conflict {
                active_room: Some(code),
                ..
            } => {
                body["active_room"] = json!(code);
            }
            ApiError::Store(e) => {
                log::error!("store error: {e}");
                body["error"] = json!(e.to_string());
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn conflict_carries_active_room() {
        let err = ApiError::already_active("AB12");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["active_room"], "AB12");
    }

    #[actix_rt::test]
    async fn not_found_maps_to_404() {
        let err = ApiError::not_found("Room not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["message"], "Room not found");
        assert!(v.get("active_room").is_none());
    }
}
