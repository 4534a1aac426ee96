//! Translation of [`GuestFilter`]s into PostgREST query parameters.
//!
//! Patterns become `ilike` operators with `*` as the wildcard. `%`, `_` and
//! `\` in the typed name are escaped; PostgREST offers no escape for `*`, so a
//! literal asterisk in a name still acts as a wildcard.
//!
//! PostgREST cannot express "this column is contained in a value", so filters
//! using [`NamePattern::ContainedIn`] are evaluated client-side.

use rsvp_core::store::{GuestFilter, NamePattern};

/// How a filter is carried out against the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
  /// Send these query parameters.
  Remote(Vec<(String, String)>),
  /// Fetch every row and evaluate the filter locally.
  Local,
}

pub fn plan(filter: &GuestFilter) -> Plan {
  match filter {
    GuestFilter::Name { first, last } => {
      let mut params = Vec::new();
      let Some(value) = like_value(first) else { return Plan::Local };
      params.push(("first_name".to_owned(), format!("ilike.{value}")));
      if let Some(last) = last {
        let Some(value) = like_value(last) else { return Plan::Local };
        params.push(("last_name".to_owned(), format!("ilike.{value}")));
      }
      Plan::Remote(params)
    }
    GuestFilter::EitherName(p) => {
      let Some(value) = like_value(p) else { return Plan::Local };
      let value = quote(&value);
      Plan::Remote(vec![(
        "or".to_owned(),
        format!("(first_name.ilike.{value},last_name.ilike.{value})"),
      )])
    }
  }
}

fn like_value(pattern: &NamePattern) -> Option<String> {
  match pattern {
    NamePattern::Exact(v) => Some(escape_like(v)),
    NamePattern::Prefix(v) => Some(format!("{}*", escape_like(v))),
    NamePattern::Contains(v) => Some(format!("*{}*", escape_like(v))),
    NamePattern::ContainedIn(_) => None,
  }
}

fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

/// Double-quote a value inside an `or=(...)` list so commas, dots and
/// parentheses in it are not read as syntax.
fn quote(s: &str) -> String {
  format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
