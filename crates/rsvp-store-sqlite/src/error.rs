//! Error type for `rsvp-store-sqlite`.

use rsvp_core::store::{FailureKind, StoreError};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unreadable rsvp value: {0:?}")]
  Rsvp(String),

  /// An update targeted a guest that does not exist.
  #[error("guest not found: {0}")]
  GuestNotFound(uuid::Uuid),
}

impl StoreError for Error {
  /// Read-only databases and refused permissions are deployment problems,
  /// not transient failures.
  fn kind(&self) -> FailureKind {
    let Self::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(e, _),
    )) = self
    else {
      return FailureKind::Transport;
    };
    match e.code {
      ErrorCode::PermissionDenied
      | ErrorCode::ReadOnly
      | ErrorCode::AuthorizationForStatementDenied => FailureKind::AccessDenied,
      _ => FailureKind::Transport,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
