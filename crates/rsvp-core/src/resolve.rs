//! Guest resolution: typed name → candidate guests with their linked parties.
//!
//! Three matching strategies run against the store, always all of them, and
//! their hits are merged into one list of initial matches:
//!
//! | strategy  | filter                                                   |
//! |-----------|----------------------------------------------------------|
//! | exact     | first = first, and last = last when a last name is given |
//! | prefix    | first starts with first and last starts with last; only with a last name |
//! | substring | either field contains first, or first contains either field; kept only when the full name contains first or last |
//!
//! Every initial match is then expanded to its linked set (itself, the guest
//! its `plus_one_id` points at, and every guest pointing back at it). The
//! plus-one link is stored in one direction, so the reverse lookup is what
//! makes it mutual.
//!
//! Merging keeps the first occurrence of each guest id, so the output is in
//! discovery order and never holds the same guest twice.

use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  guest::Guest,
  name::ParsedName,
  store::{GuestFilter, GuestStore, NamePattern},
};

// ─── Strategies ──────────────────────────────────────────────────────────────

/// Exact, case-insensitive match on first name, and on last name if given.
pub fn exact_filter(name: &ParsedName) -> GuestFilter {
  GuestFilter::Name {
    first: NamePattern::Exact(name.first.clone()),
    last:  name.has_last().then(|| NamePattern::Exact(name.last.clone())),
  }
}

/// Prefix match on both names. `None` when no last name was typed.
pub fn prefix_filter(name: &ParsedName) -> Option<GuestFilter> {
  name.has_last().then(|| GuestFilter::Name {
    first: NamePattern::Prefix(name.first.clone()),
    last:  Some(NamePattern::Prefix(name.last.clone())),
  })
}

/// The two directions of the substring strategy: a name field containing the
/// typed first name, and a name field contained in it.
pub fn substring_filters(name: &ParsedName) -> [GuestFilter; 2] {
  [
    GuestFilter::EitherName(NamePattern::Contains(name.first.clone())),
    GuestFilter::EitherName(NamePattern::ContainedIn(name.first.clone())),
  ]
}

/// Whether a substring hit is close enough to keep: the lower-cased
/// `"first last"` must contain the typed first name, or the typed last name.
pub fn substring_hit_is_relevant(guest: &Guest, name: &ParsedName) -> bool {
  let full = format!("{} {}", guest.first_name, guest.last_name).to_lowercase();
  full.contains(&name.first.to_lowercase())
    || (name.has_last() && full.contains(&name.last.to_lowercase()))
}

// ─── Ordered dedup ───────────────────────────────────────────────────────────

/// An insertion-ordered list of guests that ignores ids it has already seen.
#[derive(Debug, Default)]
struct Discovered {
  seen:   HashSet<Uuid>,
  guests: Vec<Guest>,
}

impl Discovered {
  fn push(&mut self, guest: Guest) -> bool {
    if self.seen.insert(guest.id) {
      self.guests.push(guest);
      true
    } else {
      false
    }
  }

  fn extend(&mut self, guests: impl IntoIterator<Item = Guest>) -> usize {
    let mut added = 0;
    for guest in guests {
      if self.push(guest) {
        added += 1;
      }
    }
    added
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve a parsed name to every plausible guest, each followed by its
/// linked party. An empty result means nobody matched.
pub async fn resolve<S: GuestStore>(
  store: &S,
  name: &ParsedName,
) -> Result<Vec<Guest>> {
  let initial = initial_matches(store, name).await?;

  let mut result = Discovered::default();
  for guest in initial {
    let linked = linked_set(store, guest).await?;
    result.extend(linked);
  }

  debug!(
    first = %name.first,
    last = %name.last,
    candidates = result.guests.len(),
    "resolved guest name"
  );
  Ok(result.guests)
}

/// Run every strategy and merge their hits, first-seen first.
pub async fn initial_matches<S: GuestStore>(
  store: &S,
  name: &ParsedName,
) -> Result<Vec<Guest>> {
  let mut matches = Discovered::default();

  let exact = store
    .find_guests(&exact_filter(name))
    .await
    .map_err(Error::lookup)?;
  let added = matches.extend(exact);
  debug!(added, "exact strategy");

  if let Some(filter) = prefix_filter(name) {
    let prefix = store.find_guests(&filter).await.map_err(Error::lookup)?;
    let added = matches.extend(prefix);
    debug!(added, "prefix strategy");
  }

  for filter in substring_filters(name) {
    let hits = store.find_guests(&filter).await.map_err(Error::lookup)?;
    let added = matches.extend(
      hits
        .into_iter()
        .filter(|g| substring_hit_is_relevant(g, name)),
    );
    debug!(added, ?filter, "substring strategy");
  }

  Ok(matches.guests)
}

/// The guest itself, the guest its `plus_one_id` points at, and every guest
/// whose `plus_one_id` points back at it. The guest never appears twice.
pub async fn linked_set<S: GuestStore>(
  store: &S,
  guest: Guest,
) -> Result<Vec<Guest>> {
  let origin = guest.id;
  let forward = guest.plus_one_id;
  let mut linked = vec![guest];

  if let Some(partner_id) = forward {
    match store.get_guest(partner_id).await.map_err(Error::lookup)? {
      Some(partner) if partner.id != origin => linked.push(partner),
      Some(_) => debug!(%origin, "ignoring self-referencing plus one"),
      None => debug!(%origin, %partner_id, "plus one record is missing"),
    }
  }

  let reverse = store
    .guests_linked_to(origin)
    .await
    .map_err(Error::lookup)?;
  for other in reverse {
    if other.id != origin && !linked.iter().any(|l| l.id == other.id) {
      linked.push(other);
    }
  }

  Ok(linked)
}
