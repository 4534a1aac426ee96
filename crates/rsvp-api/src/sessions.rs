//! Handlers for `/sessions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/sessions` | 201, new wizard at name entry |
//! | `GET`    | `/sessions/{id}` | current view |
//! | `DELETE` | `/sessions/{id}` | 204 |
//! | `POST`   | `/sessions/{id}/name` | Body: `{"name":"Jane Smith"}` |
//! | `POST`   | `/sessions/{id}/toggle` | Body: `{"guest_id":"…"}` |
//! | `POST`   | `/sessions/{id}/confirm` | |
//! | `POST`   | `/sessions/{id}/choose` | Body: `{"guest_id":"…"}` |
//! | `PUT`    | `/sessions/{id}/form` | Body: an `RsvpForm`; returns visibility |
//! | `POST`   | `/sessions/{id}/submit` | Body: an `RsvpForm` |
//! | `POST`   | `/sessions/{id}/back` | |
//! | `POST`   | `/sessions/{id}/restart` | |
//!
//! Every success returns `{"session_id": …, "view": …}`. A failed step leaves
//! the session as it was.

use std::{
  collections::HashMap,
  sync::{Arc, RwLock},
  time::{Duration, Instant},
};

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rsvp_core::{
  store::GuestStore,
  wizard::{RsvpForm, View, Wizard},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Session table ───────────────────────────────────────────────────────────

type Session = Arc<Mutex<Wizard>>;

/// Idle lifetime used by [`Sessions::default`]: one day.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(86_400);

#[derive(Debug)]
struct Entry {
  wizard:  Session,
  touched: Instant,
}

/// Live wizard sessions. Each wizard has its own lock, so slow store calls
/// in one session never block another.
///
/// A session idle for longer than the TTL is gone: lookups treat it as
/// unknown, and [`Sessions::create`] sweeps such entries out of the table.
#[derive(Debug)]
pub struct Sessions {
  inner: RwLock<HashMap<Uuid, Entry>>,
  ttl:   Duration,
}

impl Default for Sessions {
  fn default() -> Self { Self::new(DEFAULT_SESSION_TTL) }
}

impl Sessions {
  pub fn new(ttl: Duration) -> Self {
    Self {
      inner: RwLock::new(HashMap::new()),
      ttl,
    }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  pub fn create(&self) -> Uuid {
    let id = Uuid::new_v4();
    let now = Instant::now();
    let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
    let before = inner.len();
    inner.retain(|_, entry| now.duration_since(entry.touched) <= self.ttl);
    if inner.len() < before {
      debug!(expired = before - inner.len(), "idle sessions evicted");
    }
    inner.insert(id, Entry {
      wizard:  Arc::new(Mutex::new(Wizard::new())),
      touched: now,
    });
    id
  }

  /// The live session `id`, refreshing its idle timer.
  pub fn get(&self, id: Uuid) -> Option<Session> {
    let now = Instant::now();
    let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
    let entry = inner.get_mut(&id)?;
    if now.duration_since(entry.touched) > self.ttl {
      inner.remove(&id);
      return None;
    }
    entry.touched = now;
    Some(Arc::clone(&entry.wizard))
  }

  pub fn remove(&self, id: Uuid) -> bool {
    self
      .inner
      .write()
      .unwrap_or_else(|e| e.into_inner())
      .remove(&id)
      .is_some()
  }

  /// Entries in the table, including idle ones not yet swept.
  pub fn len(&self) -> usize {
    self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionBody {
  pub session_id: Uuid,
  pub view:       View,
}

#[derive(Debug, Deserialize)]
pub struct NameBody {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GuestIdBody {
  pub guest_id: Uuid,
}

fn session<S>(state: &AppState<S>, id: Uuid) -> Result<Session, ApiError> {
  state.sessions.get(id).ok_or(ApiError::SessionNotFound(id))
}

fn body(id: Uuid, wizard: &Wizard) -> Json<SessionBody> {
  Json(SessionBody {
    session_id: id,
    view:       wizard.view(),
  })
}

/// Run a synchronous wizard step and return the resulting view.
async fn step<S>(
  state: &AppState<S>,
  id: Uuid,
  f: impl FnOnce(&mut Wizard) -> rsvp_core::Result<()>,
) -> Result<Json<SessionBody>, ApiError> {
  let session = session(state, id)?;
  let mut wizard = session.lock().await;
  f(&mut wizard)?;
  Ok(body(id, &wizard))
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// `POST /sessions`
pub async fn create<S>(State(state): State<AppState<S>>) -> impl IntoResponse
where
  S: GuestStore,
{
  let id = state.sessions.create();
  info!(session = %id, open = state.sessions.len(), "session started");
  (StatusCode::CREATED, body(id, &Wizard::new()))
}

/// `GET /sessions/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: GuestStore,
{
  step(&state, id, |_| Ok(())).await
}

/// `DELETE /sessions/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: GuestStore,
{
  if !state.sessions.remove(id) {
    return Err(ApiError::SessionNotFound(id));
  }
  info!(session = %id, "session ended");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Steps ───────────────────────────────────────────────────────────────────

/// `POST /sessions/{id}/name`, body: `{"name":"Jane Smith"}`
pub async fn name<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(input): Json<NameBody>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: GuestStore,
{
  let session = session(&state, id)?;
  let mut wizard = session.lock().await;
  wizard.submit_name(&*state.store, &input.name).await?;
  Ok(body(id, &wizard))
}

/// `POST /sessions/{id}/toggle`, body: `{"guest_id":"…"}`
pub async fn toggle<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(input): Json<GuestIdBody>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: GuestStore,
{
  step(&state, id, |w| w.toggle(input.guest_id)).await
}

/// `POST /sessions/{id}/confirm`
pub async fn confirm<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: GuestStore,
{
  step(&state, id, Wizard::confirm).await
}

/// `POST /sessions/{id}/choose`, body: `{"guest_id":"…"}`
pub async fn choose<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(input): Json<GuestIdBody>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: GuestStore,
{
  step(&state, id, |w| w.choose(input.guest_id)).await
}

/// `PUT /sessions/{id}/form`: stores the answers so far and returns the
/// resulting section visibility.
pub async fn edit<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(form): Json<RsvpForm>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: GuestStore,
{
  step(&state, id, |w| w.edit(form)).await
}

/// `POST /sessions/{id}/submit`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(form): Json<RsvpForm>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: GuestStore,
{
  let session = session(&state, id)?;
  let mut wizard = session.lock().await;
  wizard.submit(&*state.store, form).await?;
  Ok(body(id, &wizard))
}

/// `POST /sessions/{id}/back`
pub async fn back<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: GuestStore,
{
  step(&state, id, Wizard::back).await
}

/// `POST /sessions/{id}/restart`
pub async fn restart<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: GuestStore,
{
  step(&state, id, Wizard::restart).await
}
