//! [`SqliteStore`]: the SQLite implementation of [`GuestStore`].

use std::path::Path;

use rsvp_core::{
  guest::{Guest, GuestUpdate},
  store::{GuestFilter, GuestStore, NamePattern},
};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawGuest, encode_dt, encode_uuid, escape_like},
  schema::{GUEST_COLUMNS, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A guest list backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Rows come
/// back in insertion (`rowid`) order.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert one guest record.
  pub async fn insert_guest(&self, guest: &Guest) -> Result<()> {
    self.insert_guests(std::slice::from_ref(guest)).await?;
    Ok(())
  }

  /// Insert guest records in one transaction; either all land or none do.
  /// Returns the number inserted.
  pub async fn insert_guests(&self, guests: &[Guest]) -> Result<usize> {
    let guests = guests.to_vec();

    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO guests (
               id, first_name, last_name, plus_one_id, rsvp,
               meal_choice, song_request, dietary_notes, general_notes,
               email, phone, address, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          )?;
          for g in &guests {
            stmt.execute(rusqlite::params![
              encode_uuid(g.id),
              g.first_name,
              g.last_name,
              g.plus_one_id.map(encode_uuid),
              g.rsvp.map(|a| a.as_str()),
              g.meal_choice,
              g.song_request,
              g.dietary_notes,
              g.general_notes,
              g.email,
              g.phone,
              g.address,
              g.updated_at.map(encode_dt),
            ])?;
          }
        }
        tx.commit()?;
        Ok(guests.len())
      })
      .await?;

    debug!(count, "inserted guests");
    Ok(count)
  }

  async fn select(&self, clause: String, params: Vec<String>) -> Result<Vec<Guest>> {
    let raws: Vec<RawGuest> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {GUEST_COLUMNS} FROM guests WHERE {clause} ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawGuest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGuest::into_guest).collect()
  }
}

// ─── Filter translation ──────────────────────────────────────────────────────

/// SQL condition for `pattern` applied to `column`, pushing its bound value
/// onto `params`. Comparisons go through `lower()`, so case folding is
/// ASCII-only.
fn pattern_sql(column: &str, pattern: &NamePattern, params: &mut Vec<String>) -> String {
  params.push(match pattern {
    NamePattern::Exact(v) | NamePattern::ContainedIn(v) => v.clone(),
    NamePattern::Prefix(v) => format!("{}%", escape_like(v)),
    NamePattern::Contains(v) => format!("%{}%", escape_like(v)),
  });
  let n = params.len();
  match pattern {
    NamePattern::Exact(_) => format!("lower({column}) = lower(?{n})"),
    NamePattern::Prefix(_) | NamePattern::Contains(_) => {
      format!("lower({column}) LIKE lower(?{n}) ESCAPE '\\'")
    }
    NamePattern::ContainedIn(_) => {
      format!("({column} <> '' AND instr(lower(?{n}), lower({column})) > 0)")
    }
  }
}

fn filter_sql(filter: &GuestFilter) -> (String, Vec<String>) {
  let mut params = Vec::new();
  let clause = match filter {
    GuestFilter::Name { first, last } => {
      let mut clause = pattern_sql("first_name", first, &mut params);
      if let Some(last) = last {
        clause = format!("{clause} AND {}", pattern_sql("last_name", last, &mut params));
      }
      clause
    }
    GuestFilter::EitherName(p) => {
      let first = pattern_sql("first_name", p, &mut params);
      let last = pattern_sql("last_name", p, &mut params);
      format!("({first} OR {last})")
    }
  };
  (clause, params)
}

// ─── GuestStore impl ─────────────────────────────────────────────────────────

impl GuestStore for SqliteStore {
  type Error = Error;

  async fn find_guests(&self, filter: &GuestFilter) -> Result<Vec<Guest>> {
    let (clause, params) = filter_sql(filter);
    debug!(%clause, "querying guests");
    self.select(clause, params).await
  }

  async fn get_guest(&self, id: Uuid) -> Result<Option<Guest>> {
    let mut found = self.select("id = ?1".into(), vec![encode_uuid(id)]).await?;
    Ok(found.pop())
  }

  async fn guests_linked_to(&self, id: Uuid) -> Result<Vec<Guest>> {
    self
      .select("plus_one_id = ?1".into(), vec![encode_uuid(id)])
      .await
  }

  async fn update_guest(&self, id: Uuid, update: &GuestUpdate) -> Result<Guest> {
    let id_str        = encode_uuid(id);
    let rsvp          = update.rsvp.as_str();
    let meal_choice   = update.meal_choice.clone();
    let song_request  = update.song_request.clone();
    let dietary_notes = update.dietary_notes.clone();
    let general_notes = update.general_notes.clone();
    let updated_at    = encode_dt(update.updated_at);

    let raw: Option<RawGuest> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "UPDATE guests SET
             rsvp = ?2, meal_choice = ?3, song_request = ?4,
             dietary_notes = ?5, general_notes = ?6, updated_at = ?7
           WHERE id = ?1
           RETURNING {GUEST_COLUMNS}"
        );
        Ok(conn
          .query_row(
            &sql,
            rusqlite::params![
              id_str,
              rsvp,
              meal_choice,
              song_request,
              dietary_notes,
              general_notes,
              updated_at,
            ],
            RawGuest::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.ok_or(Error::GuestNotFound(id))?.into_guest()
  }
}
