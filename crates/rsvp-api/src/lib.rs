//! JSON API for the RSVP wizard.
//!
//! Exposes an axum [`Router`] backed by any [`rsvp_core::store::GuestStore`].
//! Each browser tab gets a server-side session holding one
//! [`rsvp_core::wizard::Wizard`]; every response carries the wizard's current
//! view. Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rsvp_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod lookup;
pub mod sessions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use rsvp_core::store::GuestStore;

pub use error::ApiError;
pub use sessions::{DEFAULT_SESSION_TTL, Sessions};

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub sessions: Arc<Sessions>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      sessions: Arc::clone(&self.sessions),
    }
  }
}

/// Build the API router for `store`, with sessions that expire after
/// [`sessions::DEFAULT_SESSION_TTL`] of inactivity.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: GuestStore + 'static,
{
  api_router_with_sessions(store, Sessions::default())
}

/// [`api_router`] over a caller-configured session table.
pub fn api_router_with_sessions<S>(
  store: Arc<S>,
  sessions: Sessions,
) -> Router<()>
where
  S: GuestStore + 'static,
{
  let state = AppState {
    store,
    sessions: Arc::new(sessions),
  };

  Router::new()
    // Sessions
    .route("/sessions", post(sessions::create::<S>))
    .route(
      "/sessions/{id}",
      get(sessions::get_one::<S>).delete(sessions::delete_one::<S>),
    )
    // Wizard steps
    .route("/sessions/{id}/name", post(sessions::name::<S>))
    .route("/sessions/{id}/toggle", post(sessions::toggle::<S>))
    .route("/sessions/{id}/confirm", post(sessions::confirm::<S>))
    .route("/sessions/{id}/choose", post(sessions::choose::<S>))
    .route("/sessions/{id}/form", put(sessions::edit::<S>))
    .route("/sessions/{id}/submit", post(sessions::submit::<S>))
    .route("/sessions/{id}/back", post(sessions::back::<S>))
    .route("/sessions/{id}/restart", post(sessions::restart::<S>))
    // Stateless
    .route("/lookup", get(lookup::handler::<S>))
    .with_state(state)
}
