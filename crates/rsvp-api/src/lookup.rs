//! `GET /lookup?name=<typed name>`: runs the resolver without a session.
//!
//! Returns the candidate cards the selection step would show, in discovery
//! order, or 404 when nobody matches.

use axum::{
  Json,
  extract::{Query, State},
};
use rsvp_core::{
  Error as CoreError,
  name::parse_full_name,
  resolve::resolve,
  store::GuestStore,
  wizard::CandidateCard,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct LookupParams {
  #[serde(default)]
  pub name: String,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<LookupParams>,
) -> Result<Json<Vec<CandidateCard>>, ApiError>
where
  S: GuestStore,
{
  let name = parse_full_name(&params.name).ok_or(CoreError::EmptyName)?;
  let found = resolve(&*state.store, &name).await?;
  if found.is_empty() {
    return Err(CoreError::NotFound(params.name.trim().to_owned()).into());
  }
  Ok(Json(CandidateCard::list(&found, &[])))
}
