//! [`MemoryStore`], an in-process [`GuestStore`] for tests and demos.
//!
//! Guests live in a `Vec` in insertion order, which is also the order every
//! query returns them in. Failures can be switched on to exercise the error
//! paths of the resolver and the wizard.

use std::{
  collections::HashSet,
  sync::{
    RwLock,
    atomic::{AtomicBool, Ordering},
  },
};

use thiserror::Error;
use uuid::Uuid;

use crate::{
  guest::{Guest, GuestUpdate},
  store::{FailureKind, GuestFilter, GuestStore, StoreError},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("access denied by policy")]
  AccessDenied,

  #[error("store unavailable")]
  Unavailable,

  #[error("guest not found: {0}")]
  GuestNotFound(Uuid),

  #[error("update rejected for guest {0}")]
  UpdateRejected(Uuid),
}

impl StoreError for MemoryError {
  fn kind(&self) -> FailureKind {
    match self {
      Self::AccessDenied => FailureKind::AccessDenied,
      _ => FailureKind::Transport,
    }
  }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  guests:       RwLock<Vec<Guest>>,
  deny_access:  AtomicBool,
  fail_reads:   AtomicBool,
  fail_updates: RwLock<HashSet<Uuid>>,
}

impl MemoryStore {
  pub fn new(guests: Vec<Guest>) -> Self {
    Self {
      guests: RwLock::new(guests),
      ..Self::default()
    }
  }

  /// A copy of the stored record, bypassing failure injection.
  pub fn guest(&self, id: Uuid) -> Option<Guest> {
    self.read().iter().find(|g| g.id == id).cloned()
  }

  /// Make every call fail as a policy rejection.
  pub fn deny_access(&self, on: bool) {
    self.deny_access.store(on, Ordering::SeqCst);
  }

  /// Make every read fail as if the store were unreachable.
  pub fn fail_reads(&self, on: bool) {
    self.fail_reads.store(on, Ordering::SeqCst);
  }

  /// Make updates of `id` fail.
  pub fn fail_updates_for(&self, id: Uuid) {
    self
      .fail_updates
      .write()
      .unwrap_or_else(|e| e.into_inner())
      .insert(id);
  }

  fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Guest>> {
    self.guests.read().unwrap_or_else(|e| e.into_inner())
  }

  fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Guest>> {
    self.guests.write().unwrap_or_else(|e| e.into_inner())
  }

  fn check_read(&self) -> Result<(), MemoryError> {
    if self.deny_access.load(Ordering::SeqCst) {
      return Err(MemoryError::AccessDenied);
    }
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(MemoryError::Unavailable);
    }
    Ok(())
  }

  fn select(&self, pred: impl Fn(&Guest) -> bool) -> Result<Vec<Guest>, MemoryError> {
    self.check_read()?;
    Ok(self.read().iter().filter(|g| pred(g)).cloned().collect())
  }
}

impl GuestStore for MemoryStore {
  type Error = MemoryError;

  async fn find_guests(&self, filter: &GuestFilter) -> Result<Vec<Guest>, MemoryError> {
    self.select(|g| filter.matches(g))
  }

  async fn get_guest(&self, id: Uuid) -> Result<Option<Guest>, MemoryError> {
    Ok(self.select(|g| g.id == id)?.into_iter().next())
  }

  async fn guests_linked_to(&self, id: Uuid) -> Result<Vec<Guest>, MemoryError> {
    self.select(|g| g.plus_one_id == Some(id))
  }

  async fn update_guest(
    &self,
    id: Uuid,
    update: &GuestUpdate,
  ) -> Result<Guest, MemoryError> {
    if self.deny_access.load(Ordering::SeqCst) {
      return Err(MemoryError::AccessDenied);
    }
    let rejected = self
      .fail_updates
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .contains(&id);
    if rejected {
      return Err(MemoryError::UpdateRejected(id));
    }

    let mut guests = self.write();
    let guest = guests
      .iter_mut()
      .find(|g| g.id == id)
      .ok_or(MemoryError::GuestNotFound(id))?;
    guest.apply(update);
    Ok(guest.clone())
  }
}
