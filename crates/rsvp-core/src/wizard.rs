//! The RSVP wizard: name entry → candidate selection → RSVP details →
//! submitted.
//!
//! A [`Wizard`] owns everything one guest's session knows: the candidates
//! found for the typed name, which of them are selected, the party being
//! answered for, and the in-progress answers. Every transition is a method;
//! a method called in the wrong stage fails with
//! [`Error::InvalidTransition`] and leaves the wizard untouched. Other
//! failures leave the stage as it was, so the caller can show the message and
//! let the guest try again; a failed [`Wizard::submit`] keeps the submitted
//! answers as the form.
//!
//! [`Wizard::view`] is the rendering boundary: a serialisable snapshot of
//! what the current step should show.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  guest::{Attendance, Guest, GuestUpdate},
  name::parse_full_name,
  resolve::resolve,
  store::GuestStore,
};

// ─── Party ───────────────────────────────────────────────────────────────────

/// Which member of the party an answer or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Primary,
  PlusOne,
}

/// The guest answering and, if linked, their plus one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Party {
  pub primary:  Guest,
  pub plus_one: Option<Guest>,
}

impl Party {
  /// Build the party for `primary_id` from already-resolved candidates. The
  /// plus one is the candidate the primary points at, or failing that the
  /// first candidate pointing at the primary. Nothing is fetched.
  pub fn from_candidates(primary_id: Uuid, candidates: &[Guest]) -> Option<Self> {
    let primary = candidates.iter().find(|g| g.id == primary_id)?;
    let plus_one = partner_of(primary, candidates).cloned();
    Some(Self { primary: primary.clone(), plus_one })
  }

  /// `"RSVP for Jane Smith & John Doe"`.
  pub fn greeting(&self) -> String {
    match &self.plus_one {
      Some(p) => format!(
        "RSVP for {} & {}",
        self.primary.full_name(),
        p.full_name()
      ),
      None => format!("RSVP for {}", self.primary.full_name()),
    }
  }
}

fn partner_of<'a>(guest: &Guest, candidates: &'a [Guest]) -> Option<&'a Guest> {
  let forward = guest
    .plus_one_id
    .and_then(|pid| candidates.iter().find(|c| c.id == pid));
  forward
    .or_else(|| {
      candidates
        .iter()
        .find(|c| c.plus_one_id == Some(guest.id))
    })
    .filter(|c| c.id != guest.id)
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// One person's answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answers {
  #[serde(default)]
  pub rsvp:          Option<Attendance>,
  #[serde(default)]
  pub meal_choice:   Option<String>,
  #[serde(default)]
  pub dietary_notes: Option<String>,
  #[serde(default)]
  pub general_notes: Option<String>,
}

impl Answers {
  fn attending(&self) -> bool { self.rsvp.is_some_and(Attendance::is_yes) }

  /// Pre-filled from a stored record: the previous answer, the meal choice
  /// only if that answer was yes, and any notes.
  fn prefilled(guest: &Guest) -> Self {
    let attending = guest.rsvp.is_some_and(Attendance::is_yes);
    Self {
      rsvp:          guest.rsvp,
      meal_choice:   attending
        .then(|| non_blank(&guest.meal_choice))
        .flatten(),
      dietary_notes: non_blank(&guest.dietary_notes),
      general_notes: non_blank(&guest.general_notes),
    }
  }

  fn update(
    &self,
    role: Role,
    song_request: &Option<String>,
    now: DateTime<Utc>,
  ) -> Result<GuestUpdate> {
    let rsvp = self.rsvp.ok_or(Error::MissingResponse(role))?;
    let meal_choice = if rsvp.is_yes() {
      Some(non_blank(&self.meal_choice).ok_or(Error::MissingMealChoice(role))?)
    } else {
      None
    };
    Ok(GuestUpdate {
      rsvp,
      meal_choice,
      song_request: song_request.clone(),
      dietary_notes: non_blank(&self.dietary_notes),
      general_notes: non_blank(&self.general_notes),
      updated_at: now,
    })
  }
}

/// Everything the details step collects. The song request is shared by the
/// party and written to both records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RsvpForm {
  #[serde(default)]
  pub primary:      Answers,
  #[serde(default)]
  pub plus_one:     Option<Answers>,
  #[serde(default)]
  pub song_request: Option<String>,
}

impl RsvpForm {
  /// The form as first shown for `party`. The song request comes from the
  /// primary, or from the plus one if the primary has none.
  pub fn prefilled(party: &Party) -> Self {
    let song_request = non_blank(&party.primary.song_request).or_else(|| {
      party
        .plus_one
        .as_ref()
        .and_then(|p| non_blank(&p.song_request))
    });
    Self {
      primary: Answers::prefilled(&party.primary),
      plus_one: party.plus_one.as_ref().map(Answers::prefilled),
      song_request,
    }
  }

  /// Which sections are shown for the current answers.
  pub fn visibility(&self) -> Visibility {
    let primary_details = self.primary.attending();
    let plus_one_details = self.plus_one.as_ref().is_some_and(Answers::attending);
    Visibility {
      primary_details,
      plus_one_section: self.plus_one.is_some(),
      plus_one_details,
      song_request: primary_details || plus_one_details,
    }
  }

  /// Fit the form to `party`: a plus one's answers are only accepted when
  /// the party has one, and are defaulted when it does.
  fn fitted(mut self, party: &Party) -> Result<Self> {
    let has_plus_one = party.plus_one.is_some();
    if !has_plus_one && self.plus_one.is_some() {
      return Err(Error::NoPlusOne);
    }
    if has_plus_one && self.plus_one.is_none() {
      self.plus_one = Some(Answers::default());
    }
    Ok(self)
  }

  /// The record updates to write. Text is trimmed and blanks become null.
  /// A guest who declines has no meal choice; their notes and the shared
  /// song request are kept as submitted, hidden or not.
  pub fn updates(&self, now: DateTime<Utc>) -> Result<PartyUpdates> {
    let song_request = non_blank(&self.song_request);
    let primary = self.primary.update(Role::Primary, &song_request, now)?;
    let plus_one = self
      .plus_one
      .as_ref()
      .map(|a| a.update(Role::PlusOne, &song_request, now))
      .transpose()?;
    Ok(PartyUpdates { primary, plus_one })
  }
}

/// The writes one submission performs.
#[derive(Debug, Clone, PartialEq)]
pub struct PartyUpdates {
  pub primary:  GuestUpdate,
  pub plus_one: Option<GuestUpdate>,
}

/// Section visibility for the details step. Each person's meal, dietary and
/// general-notes fields follow their own answer; the shared song request is
/// shown while either of them is attending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
  pub primary_details:  bool,
  pub plus_one_section: bool,
  pub plus_one_details: bool,
  pub song_request:     bool,
}

fn non_blank(s: &Option<String>) -> Option<String> {
  s.as_deref()
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
}

// ─── Stages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
  NameEntry,
  CandidateSelection,
  RsvpDetail,
  Submitted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
  NameEntry,
  CandidateSelection {
    candidates: Vec<Guest>,
    /// Selected candidate ids in the order they were picked.
    selected:   Vec<Uuid>,
  },
  RsvpDetail {
    party: Party,
    form:  RsvpForm,
  },
  Submitted {
    /// The records as stored after the update.
    party: Party,
  },
}

impl Stage {
  pub fn kind(&self) -> StageKind {
    match self {
      Self::NameEntry => StageKind::NameEntry,
      Self::CandidateSelection { .. } => StageKind::CandidateSelection,
      Self::RsvpDetail { .. } => StageKind::RsvpDetail,
      Self::Submitted { .. } => StageKind::Submitted,
    }
  }
}

// ─── Wizard ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Wizard {
  stage: Stage,
}

impl Default for Wizard {
  fn default() -> Self { Self::new() }
}

impl Wizard {
  pub fn new() -> Self { Self { stage: Stage::NameEntry } }

  pub fn stage(&self) -> &Stage { &self.stage }

  fn invalid(&self, action: &'static str) -> Error {
    Error::InvalidTransition {
      stage: self.stage.kind(),
      action,
    }
  }

  /// NameEntry → CandidateSelection. Stays in NameEntry with
  /// [`Error::NotFound`] when nobody matches.
  pub async fn submit_name<S: GuestStore>(
    &mut self,
    store: &S,
    input: &str,
  ) -> Result<()> {
    if !matches!(self.stage, Stage::NameEntry) {
      return Err(self.invalid("look up a name"));
    }
    let name = parse_full_name(input).ok_or(Error::EmptyName)?;
    let candidates = resolve(store, &name).await?;
    if candidates.is_empty() {
      return Err(Error::NotFound(input.trim().to_owned()));
    }

    info!(count = candidates.len(), "found candidates");
    self.stage = Stage::CandidateSelection {
      candidates,
      selected: Vec::new(),
    };
    Ok(())
  }

  /// Select or deselect a candidate.
  pub fn toggle(&mut self, guest_id: Uuid) -> Result<()> {
    let Stage::CandidateSelection { candidates, selected } = &mut self.stage
    else {
      return Err(self.invalid("select a guest"));
    };
    if !candidates.iter().any(|c| c.id == guest_id) {
      return Err(Error::UnknownCandidate(guest_id));
    }
    if let Some(pos) = selected.iter().position(|id| *id == guest_id) {
      selected.remove(pos);
    } else {
      selected.push(guest_id);
    }
    Ok(())
  }

  /// CandidateSelection → RsvpDetail for the first selected guest.
  pub fn confirm(&mut self) -> Result<()> {
    let Stage::CandidateSelection { candidates, selected } = &self.stage else {
      return Err(self.invalid("confirm a selection"));
    };
    let primary_id = *selected.first().ok_or(Error::NothingSelected)?;
    let party = Party::from_candidates(primary_id, candidates)
      .ok_or(Error::UnknownCandidate(primary_id))?;
    let form = RsvpForm::prefilled(&party);

    info!(
      primary = %party.primary.id,
      plus_one = ?party.plus_one.as_ref().map(|p| p.id),
      "selected party"
    );
    self.stage = Stage::RsvpDetail { party, form };
    Ok(())
  }

  /// Select exactly `guest_id` and confirm.
  pub fn choose(&mut self, guest_id: Uuid) -> Result<()> {
    let Stage::CandidateSelection { candidates, selected } = &mut self.stage
    else {
      return Err(self.invalid("select a guest"));
    };
    if !candidates.iter().any(|c| c.id == guest_id) {
      return Err(Error::UnknownCandidate(guest_id));
    }
    *selected = vec![guest_id];
    self.confirm()
  }

  /// Replace the in-progress answers.
  pub fn edit(&mut self, form: RsvpForm) -> Result<()> {
    let Stage::RsvpDetail { party, form: current } = &mut self.stage else {
      return Err(self.invalid("edit answers"));
    };
    *current = form.fitted(party)?;
    Ok(())
  }

  /// RsvpDetail → Submitted. Writes the primary guest, then the plus one.
  ///
  /// If either write fails the wizard stays in RsvpDetail (keeping `form`)
  /// and returns [`Error::PersistenceFailure`]. The writes are not atomic: a
  /// failure on the plus one leaves the primary's record already updated,
  /// which the error reports through `primary_written`.
  pub async fn submit<S: GuestStore>(
    &mut self,
    store: &S,
    form: RsvpForm,
  ) -> Result<()> {
    let Stage::RsvpDetail { party, form: current } = &mut self.stage else {
      return Err(self.invalid("submit an RSVP"));
    };
    *current = form.fitted(party)?;
    let updates = current.updates(Utc::now())?;
    let party = party.clone();

    let primary = store
      .update_guest(party.primary.id, &updates.primary)
      .await
      .map_err(|e| Error::PersistenceFailure {
        guest_id:        party.primary.id,
        primary_written: false,
        source:          Box::new(e),
      })?;

    let plus_one = match (&party.plus_one, &updates.plus_one) {
      (Some(guest), Some(update)) => {
        let stored = store.update_guest(guest.id, update).await.map_err(|e| {
          warn!(
            primary = %primary.id,
            plus_one = %guest.id,
            error = %e,
            "plus one update failed after primary was written"
          );
          Error::PersistenceFailure {
            guest_id:        guest.id,
            primary_written: true,
            source:          Box::new(e),
          }
        })?;
        Some(stored)
      }
      _ => None,
    };

    info!(
      primary = %primary.id,
      rsvp = primary.rsvp.map(Attendance::as_str),
      plus_one = ?plus_one.as_ref().map(|p| p.id),
      "rsvp submitted"
    );
    self.stage = Stage::Submitted {
      party: Party { primary, plus_one },
    };
    Ok(())
  }

  /// CandidateSelection or RsvpDetail → NameEntry, discarding candidates,
  /// selection, party and answers.
  pub fn back(&mut self) -> Result<()> {
    match self.stage {
      Stage::CandidateSelection { .. } | Stage::RsvpDetail { .. } => {
        self.stage = Stage::NameEntry;
        Ok(())
      }
      _ => Err(self.invalid("go back")),
    }
  }

  /// Submitted → NameEntry, for the next guest.
  pub fn restart(&mut self) -> Result<()> {
    match self.stage {
      Stage::Submitted { .. } => {
        self.stage = Stage::NameEntry;
        Ok(())
      }
      _ => Err(self.invalid("start over")),
    }
  }

  pub fn view(&self) -> View {
    match &self.stage {
      Stage::NameEntry => View::NameEntry,
      Stage::CandidateSelection { candidates, selected } => {
        View::CandidateSelection {
          candidates: CandidateCard::list(candidates, selected),
        }
      }
      Stage::RsvpDetail { party, form } => View::RsvpDetail {
        greeting:   party.greeting(),
        primary:    Contact::from(&party.primary),
        plus_one:   party.plus_one.as_ref().map(Contact::from),
        form:       form.clone(),
        visibility: form.visibility(),
      },
      Stage::Submitted { party } => View::Submitted {
        greeting: party.greeting(),
        party:    party.clone(),
      },
    }
  }
}

// ─── View ────────────────────────────────────────────────────────────────────

/// What the presentation layer renders for the current stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum View {
  NameEntry,
  CandidateSelection {
    candidates: Vec<CandidateCard>,
  },
  RsvpDetail {
    greeting:   String,
    primary:    Contact,
    plus_one:   Option<Contact>,
    form:       RsvpForm,
    visibility: Visibility,
  },
  Submitted {
    greeting: String,
    party:    Party,
  },
}

/// A selectable candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateCard {
  pub id:       Uuid,
  pub name:     String,
  pub email:    Option<String>,
  pub address:  Option<String>,
  /// The linked guest's name, when that guest is also a candidate.
  pub partner:  Option<String>,
  pub selected: bool,
}

impl CandidateCard {
  /// One card per candidate, in candidate order.
  pub fn list(candidates: &[Guest], selected: &[Uuid]) -> Vec<Self> {
    candidates
      .iter()
      .map(|g| Self {
        id:       g.id,
        name:     g.full_name(),
        email:    g.email.clone(),
        address:  g.address.clone(),
        partner:  partner_of(g, candidates).map(Guest::full_name),
        selected: selected.contains(&g.id),
      })
      .collect()
  }
}

/// Display-only contact details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
  pub id:      Uuid,
  pub name:    String,
  pub email:   Option<String>,
  pub phone:   Option<String>,
  pub address: Option<String>,
}

impl From<&Guest> for Contact {
  fn from(g: &Guest) -> Self {
    Self {
      id:      g.id,
      name:    g.full_name(),
      email:   g.email.clone(),
      phone:   g.phone.clone(),
      address: g.address.clone(),
    }
  }
}
