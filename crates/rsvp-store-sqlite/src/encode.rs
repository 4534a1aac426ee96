//! Conversions between guest records and their SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings and timestamps as
//! RFC 3339. Attendance is stored as `'yes'`/`'no'`; rows written by other
//! tools may hold `''` or odd casing, which read back leniently.

use chrono::{DateTime, Utc};
use rsvp_core::guest::{Attendance, Guest};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_rsvp(s: Option<&str>) -> Result<Option<Attendance>> {
  match s.map(str::trim) {
    None | Some("") => Ok(None),
    Some(v) if v.eq_ignore_ascii_case("yes") => Ok(Some(Attendance::Yes)),
    Some(v) if v.eq_ignore_ascii_case("no") => Ok(Some(Attendance::No)),
    Some(other) => Err(Error::Rsvp(other.to_owned())),
  }
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Escape `%`, `_` and the escape character itself for use with
/// `LIKE ... ESCAPE '\'`.
pub fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw column values read directly from a `guests` row.
pub struct RawGuest {
  pub id:            String,
  pub first_name:    String,
  pub last_name:     Option<String>,
  pub plus_one_id:   Option<String>,
  pub rsvp:          Option<String>,
  pub meal_choice:   Option<String>,
  pub song_request:  Option<String>,
  pub dietary_notes: Option<String>,
  pub general_notes: Option<String>,
  pub email:         Option<String>,
  pub phone:         Option<String>,
  pub address:       Option<String>,
  pub updated_at:    Option<String>,
}

impl RawGuest {
  /// Read a row selected with [`crate::schema::GUEST_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      first_name:    row.get(1)?,
      last_name:     row.get(2)?,
      plus_one_id:   row.get(3)?,
      rsvp:          row.get(4)?,
      meal_choice:   row.get(5)?,
      song_request:  row.get(6)?,
      dietary_notes: row.get(7)?,
      general_notes: row.get(8)?,
      email:         row.get(9)?,
      phone:         row.get(10)?,
      address:       row.get(11)?,
      updated_at:    row.get(12)?,
    })
  }

  pub fn into_guest(self) -> Result<Guest> {
    Ok(Guest {
      id:            decode_uuid(&self.id)?,
      first_name:    self.first_name,
      last_name:     self.last_name.unwrap_or_default(),
      plus_one_id:   self.plus_one_id.as_deref().map(decode_uuid).transpose()?,
      rsvp:          decode_rsvp(self.rsvp.as_deref())?,
      meal_choice:   self.meal_choice,
      song_request:  self.song_request,
      dietary_notes: self.dietary_notes,
      general_notes: self.general_notes,
      email:         self.email,
      phone:         self.phone,
      address:       self.address,
      updated_at:    self.updated_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
