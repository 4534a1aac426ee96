//! SQL schema for the RSVP SQLite store.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// `plus_one_id` carries no foreign key: links may dangle, and the resolver
/// skips them.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS guests (
    id            TEXT PRIMARY KEY,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL DEFAULT '',
    plus_one_id   TEXT,            -- one direction only
    rsvp          TEXT,            -- 'yes' | 'no' | NULL
    meal_choice   TEXT,
    song_request  TEXT,
    dietary_notes TEXT,
    general_notes TEXT,
    email         TEXT,
    phone         TEXT,
    address       TEXT,
    updated_at    TEXT             -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS guests_first_idx   ON guests(lower(first_name));
CREATE INDEX IF NOT EXISTS guests_last_idx    ON guests(lower(last_name));
CREATE INDEX IF NOT EXISTS guests_plus_one_idx ON guests(plus_one_id);

PRAGMA user_version = 1;
";

/// Columns in the order [`crate::encode::RawGuest::from_row`] reads them.
pub const GUEST_COLUMNS: &str = "id, first_name, last_name, plus_one_id, rsvp, \
                                 meal_choice, song_request, dietary_notes, \
                                 general_notes, email, phone, address, \
                                 updated_at";
