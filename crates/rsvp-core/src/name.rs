//! Splitting a typed full name into the first/last pair the resolver
//! matches on.

use serde::{Deserialize, Serialize};

/// A typed name split into first and last parts. `last` is empty when only
/// one word was entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
  pub first: String,
  pub last:  String,
}

impl ParsedName {
  pub fn has_last(&self) -> bool { !self.last.is_empty() }
}

/// Parse free text into a [`ParsedName`].
///
/// The first whitespace-separated word is the first name; every remaining
/// word, joined by single spaces, is the last name. Returns `None` when the
/// input holds no words at all.
pub fn parse_full_name(input: &str) -> Option<ParsedName> {
  let mut words = input.split_whitespace();
  let first = words.next()?.to_owned();
  let last = words.collect::<Vec<_>>().join(" ");
  Some(ParsedName { first, last })
}
