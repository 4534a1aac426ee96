//! Guest records: the rows the store owns and the partial updates the core
//! writes back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ─── Attendance ──────────────────────────────────────────────────────────────

/// A guest's answer to the invitation. "Not answered yet" is `None` wherever
/// an `Attendance` is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
  Yes,
  No,
}

impl Attendance {
  pub fn is_yes(self) -> bool { matches!(self, Self::Yes) }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Yes => "yes",
      Self::No => "no",
    }
  }
}

/// Reads an optional answer, treating an empty string the same as null.
/// Hosted tables written by older form versions contain `""` for "unset".
pub fn deserialize_answer<'de, D>(
  deserializer: D,
) -> Result<Option<Attendance>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<String> = Option::deserialize(deserializer)?;
  match raw.as_deref().map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) if s.eq_ignore_ascii_case("yes") => Ok(Some(Attendance::Yes)),
    Some(s) if s.eq_ignore_ascii_case("no") => Ok(Some(Attendance::No)),
    Some(other) => Err(serde::de::Error::unknown_variant(other, &["yes", "no"])),
  }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ─── Guest ───────────────────────────────────────────────────────────────────

/// One invited person. Records are seeded externally; the core only reads
/// them and applies [`GuestUpdate`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
  pub id:            Uuid,
  pub first_name:    String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub last_name:     String,
  /// The guest's companion. Stored in one direction only; see
  /// [`crate::resolve`] for how the link is treated as mutual.
  #[serde(default)]
  pub plus_one_id:   Option<Uuid>,
  #[serde(default, deserialize_with = "deserialize_answer")]
  pub rsvp:          Option<Attendance>,
  #[serde(default)]
  pub meal_choice:   Option<String>,
  #[serde(default)]
  pub song_request:  Option<String>,
  #[serde(default)]
  pub dietary_notes: Option<String>,
  #[serde(default)]
  pub general_notes: Option<String>,
  #[serde(default)]
  pub email:         Option<String>,
  #[serde(default)]
  pub phone:         Option<String>,
  #[serde(default)]
  pub address:       Option<String>,
  #[serde(default)]
  pub updated_at:    Option<DateTime<Utc>>,
}

impl Guest {
  /// A guest with only a name set; every optional field is empty.
  pub fn new(
    first_name: impl Into<String>,
    last_name: impl Into<String>,
  ) -> Self {
    Self {
      id:            Uuid::new_v4(),
      first_name:    first_name.into(),
      last_name:     last_name.into(),
      plus_one_id:   None,
      rsvp:          None,
      meal_choice:   None,
      song_request:  None,
      dietary_notes: None,
      general_notes: None,
      email:         None,
      phone:         None,
      address:       None,
      updated_at:    None,
    }
  }

  /// `"First Last"`, or just the first name when there is no last name.
  pub fn full_name(&self) -> String {
    if self.last_name.is_empty() {
      self.first_name.clone()
    } else {
      format!("{} {}", self.first_name, self.last_name)
    }
  }

  /// Apply a partial update in place.
  pub fn apply(&mut self, update: &GuestUpdate) {
    self.rsvp = Some(update.rsvp);
    self.meal_choice = update.meal_choice.clone();
    self.song_request = update.song_request.clone();
    self.dietary_notes = update.dietary_notes.clone();
    self.general_notes = update.general_notes.clone();
    self.updated_at = Some(update.updated_at);
  }
}

// ─── GuestUpdate ─────────────────────────────────────────────────────────────

/// The fields written back on submission. Every field is written; `None`
/// clears the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestUpdate {
  pub rsvp:          Attendance,
  pub meal_choice:   Option<String>,
  pub song_request:  Option<String>,
  pub dietary_notes: Option<String>,
  pub general_notes: Option<String>,
  pub updated_at:    DateTime<Utc>,
}
