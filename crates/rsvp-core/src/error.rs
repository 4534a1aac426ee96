//! Error types for `rsvp-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{
  store::{FailureKind, StoreError},
  wizard::{Role, StageKind},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The resolver found no plausible guest for the typed name.
  #[error("no guest matches {0:?}")]
  NotFound(String),

  /// The store refused the call because of its access policy.
  #[error("store denied access: {0}")]
  AccessDenied(#[source] BoxError),

  /// The store could not be reached or failed to answer.
  #[error("store request failed: {0}")]
  TransportFailure(#[source] BoxError),

  /// An update failed during submission. `primary_written` is set when the
  /// primary guest's record had already been updated before the failure.
  #[error("failed to save RSVP for guest {guest_id}: {source}")]
  PersistenceFailure {
    guest_id:        Uuid,
    primary_written: bool,
    #[source]
    source:          BoxError,
  },

  #[error("no name was entered")]
  EmptyName,

  #[error("cannot {action} while in {stage:?}")]
  InvalidTransition {
    stage:  StageKind,
    action: &'static str,
  },

  #[error("guest {0} is not one of the candidates")]
  UnknownCandidate(Uuid),

  #[error("no candidate is selected")]
  NothingSelected,

  #[error("no attendance answer for the {0:?} guest")]
  MissingResponse(Role),

  #[error("a meal choice is required for the {0:?} guest")]
  MissingMealChoice(Role),

  #[error("answers were given for a plus one, but none is linked")]
  NoPlusOne,
}

impl Error {
  /// Wrap a failed lookup, keeping the access-denied distinction.
  pub fn lookup<E: StoreError>(e: E) -> Self {
    match e.kind() {
      FailureKind::AccessDenied => Self::AccessDenied(Box::new(e)),
      FailureKind::Transport => Self::TransportFailure(Box::new(e)),
    }
  }

  /// Short identifier for wire formats.
  pub fn code(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "not_found",
      Self::AccessDenied(_) => "access_denied",
      Self::TransportFailure(_) => "transport_failure",
      Self::PersistenceFailure { .. } => "persistence_failure",
      Self::EmptyName => "empty_name",
      Self::InvalidTransition { .. } => "invalid_transition",
      Self::UnknownCandidate(_) => "unknown_candidate",
      Self::NothingSelected => "nothing_selected",
      Self::MissingResponse(_) => "missing_response",
      Self::MissingMealChoice(_) => "missing_meal_choice",
      Self::NoPlusOne => "no_plus_one",
    }
  }

  /// The message shown to the guest.
  pub fn user_message(&self) -> String {
    match self {
      Self::NotFound(_) => "Guest not found. Please check your name and try \
                            again, or contact the couple for assistance."
        .into(),
      Self::AccessDenied(_) => "The guest list is not reachable right now \
                                because of a configuration problem. Please \
                                let the couple know."
        .into(),
      Self::TransportFailure(_) => {
        "An error occurred. Please try again later.".into()
      }
      Self::PersistenceFailure { .. } => "An error occurred while submitting \
                                          your RSVP. Please try again."
        .into(),
      Self::EmptyName => "Please enter your full name.".into(),
      Self::InvalidTransition { .. } => {
        "That step is not available right now. Please start over.".into()
      }
      Self::UnknownCandidate(_) | Self::NothingSelected => {
        "Please select your name from the list.".into()
      }
      Self::MissingResponse(Role::Primary) => {
        "Please let us know if you will attend.".into()
      }
      Self::MissingResponse(Role::PlusOne) => {
        "Please let us know if your guest will attend.".into()
      }
      Self::MissingMealChoice(Role::Primary) => {
        "Please choose a meal.".into()
      }
      Self::MissingMealChoice(Role::PlusOne) => {
        "Please choose a meal for your guest.".into()
      }
      Self::NoPlusOne => "There is no guest linked to this invitation.".into(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
