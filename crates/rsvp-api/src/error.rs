//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rsvp_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Core(e) => match e {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::EmptyName
        | CoreError::UnknownCandidate(_)
        | CoreError::NothingSelected
        | CoreError::MissingResponse(_)
        | CoreError::MissingMealChoice(_)
        | CoreError::NoPlusOne => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CoreError::AccessDenied(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CoreError::TransportFailure(_) | CoreError::PersistenceFailure { .. } => {
          StatusCode::BAD_GATEWAY
        }
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let (code, message) = match &self {
      ApiError::SessionNotFound(_) => (
        "session_not_found",
        "This page has expired. Please start over.".to_owned(),
      ),
      ApiError::Core(e) => (e.code(), e.user_message()),
    };

    match &self {
      ApiError::Core(CoreError::AccessDenied(e)) => {
        warn!(error = %e, "guest store denied access; check its policies");
      }
      ApiError::Core(e) if status.is_server_error() => {
        warn!(error = %e, "store call failed");
      }
      _ => {}
    }

    (status, Json(json!({ "error": code, "message": message }))).into_response()
  }
}
