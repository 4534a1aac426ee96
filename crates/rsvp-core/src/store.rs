//! The `GuestStore` trait and the name predicates it is queried with.
//!
//! The trait is implemented by storage backends (`rsvp-store-sqlite`,
//! `rsvp-store-postgrest`, and [`crate::memory`] for tests). The resolver and
//! the wizard depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::guest::{Guest, GuestUpdate};

// ─── Name predicates ─────────────────────────────────────────────────────────

/// A case-insensitive test against a single name field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
  /// The field equals the value.
  Exact(String),
  /// The field starts with the value.
  Prefix(String),
  /// The field contains the value.
  Contains(String),
  /// The field is non-empty and is itself contained in the value.
  ContainedIn(String),
}

impl NamePattern {
  pub fn value(&self) -> &str {
    match self {
      Self::Exact(v) | Self::Prefix(v) | Self::Contains(v) | Self::ContainedIn(v) => v,
    }
  }

  pub fn matches(&self, field: &str) -> bool {
    let field = field.to_lowercase();
    let value = self.value().to_lowercase();
    match self {
      Self::Exact(_) => field == value,
      Self::Prefix(_) => field.starts_with(&value),
      Self::Contains(_) => field.contains(&value),
      Self::ContainedIn(_) => !field.is_empty() && value.contains(&field),
    }
  }
}

/// Parameters for [`GuestStore::find_guests`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestFilter {
  /// `first` must hold for `first_name` and, when present, `last` for
  /// `last_name`.
  Name {
    first: NamePattern,
    last:  Option<NamePattern>,
  },
  /// The pattern holds for `first_name` or for `last_name`.
  EitherName(NamePattern),
}

impl GuestFilter {
  /// Evaluate the filter against a record. Backends that cannot express a
  /// filter natively fall back to this.
  pub fn matches(&self, guest: &Guest) -> bool {
    match self {
      Self::Name { first, last } => {
        first.matches(&guest.first_name)
          && last.as_ref().is_none_or(|l| l.matches(&guest.last_name))
      }
      Self::EitherName(p) => {
        p.matches(&guest.first_name) || p.matches(&guest.last_name)
      }
    }
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Why a store call failed, as far as the caller needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  /// Rejected by a permission or row-level policy; a deployment problem.
  AccessDenied,
  /// Anything else: unreachable, timed out, malformed reply.
  Transport,
}

/// Implemented by every backend error so failures can be classified without
/// knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> FailureKind { FailureKind::Transport }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the table of guest records.
///
/// Records are never created or deleted through this trait. Result order is
/// significant: the resolver keeps the first occurrence of each guest, so
/// backends return rows in a stable order.
pub trait GuestStore: Send + Sync {
  type Error: StoreError;

  /// All guests matching `filter`.
  fn find_guests<'a>(
    &'a self,
    filter: &'a GuestFilter,
  ) -> impl Future<Output = Result<Vec<Guest>, Self::Error>> + Send + 'a;

  /// Retrieve a guest by id. Returns `None` if not found.
  fn get_guest(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Guest>, Self::Error>> + Send + '_;

  /// All guests whose `plus_one_id` is `id`.
  fn guests_linked_to(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Guest>, Self::Error>> + Send + '_;

  /// Write `update` to the guest with `id` and return the stored record.
  /// Fails if the guest does not exist.
  fn update_guest<'a>(
    &'a self,
    id: Uuid,
    update: &'a GuestUpdate,
  ) -> impl Future<Output = Result<Guest, Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn patterns_ignore_case() {
    assert!(NamePattern::Exact("jane".into()).matches("JANE"));
    assert!(NamePattern::Prefix("JA".into()).matches("jane"));
    assert!(NamePattern::Contains("AN".into()).matches("Jane"));
    assert!(NamePattern::ContainedIn("JONATHAN".into()).matches("Jon"));
  }

  #[test]
  fn empty_field_is_not_contained_in_anything() {
    assert!(!NamePattern::ContainedIn("smith".into()).matches(""));
  }

  #[test]
  fn name_filter_without_last_ignores_last_name() {
    let g = Guest::new("Jane", "Smith");
    let f = GuestFilter::Name {
      first: NamePattern::Exact("jane".into()),
      last:  None,
    };
    assert!(f.matches(&g));

    let f = GuestFilter::Name {
      first: NamePattern::Exact("jane".into()),
      last:  Some(NamePattern::Exact("doe".into())),
    };
    assert!(!f.matches(&g));
  }

  #[test]
  fn either_name_checks_both_fields() {
    let g = Guest::new("Jane", "Smith");
    assert!(GuestFilter::EitherName(NamePattern::Contains("mit".into())).matches(&g));
    assert!(GuestFilter::EitherName(NamePattern::Contains("jan".into())).matches(&g));
    assert!(!GuestFilter::EitherName(NamePattern::Contains("bob".into())).matches(&g));
  }
}
