//! PostgREST backend for the RSVP guest list, for guest tables hosted behind
//! a PostgREST endpoint (such as Supabase's `/rest/v1`).

mod query;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{PostgrestConfig, PostgrestStore};

#[cfg(test)]
mod tests;
