//! Core of the wedding RSVP service: name parsing, guest resolution and the
//! RSVP wizard.
//!
//! Nothing here talks HTTP or SQL. Storage backends implement
//! [`store::GuestStore`]; the API crate drives a [`wizard::Wizard`] per
//! session.

// Native `async fn` in traits; the futures' `Send` bounds are spelled out on
// the trait methods.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod guest;
pub mod memory;
pub mod name;
pub mod resolve;
pub mod store;
pub mod wizard;

pub use error::{Error, Result};
