//! HTTP handlers for the server.

pub mod export;
pub mod session;
pub mod share;

use axum::http::StatusCode;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::CardError;
use crate::orchestrator::GENERATION_ERROR_MESSAGE;

use super::state::{AppState, Session};

/// Map a library error onto a status code and a user-facing message.
pub fn error_response(err: &CardError) -> (StatusCode, String) {
    match err {
        CardError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CardError::Busy | CardError::Superseded | CardError::NoPostcard => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CardError::TextGeneration(_) | CardError::ImageGeneration(_) => {
            (StatusCode::BAD_GATEWAY, GENERATION_ERROR_MESSAGE.to_string())
        }
        CardError::Export(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Could not export image. Please try again. ({})", err),
        ),
        CardError::Share(_) | CardError::Config(_) | CardError::Transport(_) | CardError::Io(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub(super) async fn find_session(
    state: &AppState,
    id: Uuid,
) -> Result<Arc<Session>, (StatusCode, String)> {
    state
        .session(id)
        .await
        .ok_or((StatusCode::NOT_FOUND, format!("Session {} not found", id)))
}
