//! Error type for `rsvp-store-postgrest`.

use reqwest::StatusCode;
use rsvp_core::store::{FailureKind, StoreError};
use serde::Deserialize;
use thiserror::Error;

/// PostgreSQL's `insufficient_privilege`.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The endpoint answered with a non-success status.
  #[error("{status}: {message}")]
  Status {
    status:  StatusCode,
    code:    Option<String>,
    message: String,
  },

  #[error("api key is not a valid header value")]
  InvalidKey,

  /// An update targeted a guest that does not exist or is not visible.
  #[error("guest not found: {0}")]
  GuestNotFound(uuid::Uuid),
}

impl StoreError for Error {
  fn kind(&self) -> FailureKind {
    match self {
      Self::Status { status, code, .. }
        if *status == StatusCode::UNAUTHORIZED
          || *status == StatusCode::FORBIDDEN
          || code.as_deref() == Some(INSUFFICIENT_PRIVILEGE) =>
      {
        FailureKind::AccessDenied
      }
      Self::InvalidKey => FailureKind::AccessDenied,
      _ => FailureKind::Transport,
    }
  }
}

/// The JSON body PostgREST sends with errors.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
  #[serde(default)]
  pub code:    Option<String>,
  #[serde(default)]
  pub message: Option<String>,
}

impl Error {
  /// Build a status error from a failed response, reading PostgREST's error
  /// body when there is one.
  pub(crate) async fn from_response(resp: reqwest::Response) -> Self {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    Self::Status {
      status,
      code: body.code,
      message: body.message.unwrap_or(text),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
