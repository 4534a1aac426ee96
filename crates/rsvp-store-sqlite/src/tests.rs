//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use rsvp_core::{
  Error as CoreError,
  guest::{Attendance, Guest, GuestUpdate},
  name::parse_full_name,
  resolve::resolve,
  store::{FailureKind, GuestFilter, GuestStore, NamePattern, StoreError},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn seeded(guests: &[Guest]) -> SqliteStore {
  let s = store().await;
  s.insert_guests(guests).await.unwrap();
  s
}

fn linked(first: &str, last: &str, partner: &Guest) -> Guest {
  let mut g = Guest::new(first, last);
  g.plus_one_id = Some(partner.id);
  g
}

fn names(guests: &[Guest]) -> Vec<String> {
  guests.iter().map(Guest::full_name).collect()
}

fn either(p: NamePattern) -> GuestFilter { GuestFilter::EitherName(p) }

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_guest() {
  let mut jane = Guest::new("Jane", "Smith");
  jane.email = Some("jane@example.com".into());
  jane.rsvp = Some(Attendance::No);
  jane.updated_at = Some(Utc::now());
  let s = seeded(std::slice::from_ref(&jane)).await;

  let fetched = s.get_guest(jane.id).await.unwrap().unwrap();
  assert_eq!(fetched.id, jane.id);
  assert_eq!(fetched.email.as_deref(), Some("jane@example.com"));
  assert_eq!(fetched.rsvp, Some(Attendance::No));
  assert!(fetched.updated_at.is_some());
}

#[tokio::test]
async fn get_guest_missing_returns_none() {
  let s = store().await;
  assert!(s.get_guest(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn inserted_guest_reads_back() {
  let s = store().await;
  let mut jane = Guest::new("Jane", "Smith");
  jane.rsvp = Some(Attendance::Yes);
  jane.meal_choice = Some("fish".into());
  jane.email = Some("jane@example.com".into());
  s.insert_guest(&jane).await.unwrap();

  assert_eq!(s.get_guest(jane.id).await.unwrap(), Some(jane.clone()));
  assert!(s.insert_guest(&jane).await.is_err());
}

#[tokio::test]
async fn duplicate_import_is_rolled_back() {
  let jane = Guest::new("Jane", "Smith");
  let s = seeded(std::slice::from_ref(&jane)).await;

  let bob = Guest::new("Bob", "Jones");
  assert!(s.insert_guests(&[bob.clone(), jane]).await.is_err());
  assert!(s.get_guest(bob.id).await.unwrap().is_none());
}

#[tokio::test]
async fn stray_rsvp_values_read_leniently() {
  let s = seeded(&[Guest::new("Jane", "Smith"), Guest::new("John", "Doe")]).await;
  s.conn
    .call(|conn| {
      conn.execute("UPDATE guests SET rsvp = '' WHERE first_name = 'Jane'", [])?;
      conn.execute("UPDATE guests SET rsvp = 'Yes' WHERE first_name = 'John'", [])?;
      Ok(())
    })
    .await
    .unwrap();

  let all = s
    .find_guests(&either(NamePattern::Contains(String::new())))
    .await
    .unwrap();
  assert_eq!(all[0].rsvp, None);
  assert_eq!(all[1].rsvp, Some(Attendance::Yes));
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn exact_match_ignores_case() {
  let s = seeded(&[Guest::new("Jane", "Smith"), Guest::new("Jane", "Doe")]).await;
  let found = s
    .find_guests(&GuestFilter::Name {
      first: NamePattern::Exact("JANE".into()),
      last:  Some(NamePattern::Exact("smith".into())),
    })
    .await
    .unwrap();
  assert_eq!(names(&found), ["Jane Smith"]);
}

#[tokio::test]
async fn prefix_match_on_both_names() {
  let s = seeded(&[
    Guest::new("Katherine", "Johnson"),
    Guest::new("Kathy", "Jones"),
    Guest::new("Kate", "Moss"),
  ])
  .await;
  let found = s
    .find_guests(&GuestFilter::Name {
      first: NamePattern::Prefix("kat".into()),
      last:  Some(NamePattern::Prefix("jo".into())),
    })
    .await
    .unwrap();
  assert_eq!(names(&found), ["Katherine Johnson", "Kathy Jones"]);
}

#[tokio::test]
async fn like_wildcards_in_input_are_literal() {
  let s = seeded(&[Guest::new("Ann", "Lee"), Guest::new("A%n", "Lee")]).await;
  let found = s
    .find_guests(&either(NamePattern::Contains("%".into())))
    .await
    .unwrap();
  assert_eq!(names(&found), ["A%n Lee"]);

  let found = s
    .find_guests(&either(NamePattern::Contains("a_n".into())))
    .await
    .unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn contains_checks_either_name() {
  let s = seeded(&[
    Guest::new("Anna", "Bell"),
    Guest::new("Joanne", "Price"),
    Guest::new("Bob", "Hanna"),
    Guest::new("Carl", "Ray"),
  ])
  .await;
  let found = s
    .find_guests(&either(NamePattern::Contains("ann".into())))
    .await
    .unwrap();
  assert_eq!(names(&found), ["Anna Bell", "Joanne Price", "Bob Hanna"]);
}

#[tokio::test]
async fn contained_in_skips_empty_fields() {
  let s = seeded(&[Guest::new("Jo", ""), Guest::new("Cher", ""), Guest::new("Ann", "Smith")])
    .await;
  let found = s
    .find_guests(&either(NamePattern::ContainedIn("JOANNE".into())))
    .await
    .unwrap();
  assert_eq!(names(&found), ["Jo", "Ann Smith"]);
}

#[tokio::test]
async fn sql_agrees_with_in_memory_evaluation() {
  let guests = [
    Guest::new("Jane", "Smith"),
    Guest::new("Janet", ""),
    Guest::new("Bo", "Jan"),
    Guest::new("Ben", "Nevis"),
  ];
  let s = seeded(&guests).await;
  let filters = [
    GuestFilter::Name { first: NamePattern::Exact("jane".into()), last: None },
    GuestFilter::Name {
      first: NamePattern::Prefix("Ja".into()),
      last:  Some(NamePattern::Prefix("s".into())),
    },
    either(NamePattern::Contains("jan".into())),
    either(NamePattern::ContainedIn("janet".into())),
  ];
  for f in &filters {
    let expected: Vec<_> = guests.iter().filter(|g| f.matches(g)).cloned().collect();
    let found = s.find_guests(f).await.unwrap();
    assert_eq!(names(&found), names(&expected), "{f:?}");
  }
}

#[tokio::test]
async fn linked_guests_are_found_by_reverse_link() {
  let jane = Guest::new("Jane", "Smith");
  let john = linked("John", "Doe", &jane);
  let max = linked("Max", "Smith", &jane);
  let s = seeded(&[jane.clone(), john, Guest::new("Bob", "Jones"), max]).await;

  let found = s.guests_linked_to(jane.id).await.unwrap();
  assert_eq!(names(&found), ["John Doe", "Max Smith"]);
}

// ─── Updates ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_overwrites_answer_fields() {
  let mut jane = Guest::new("Jane", "Smith");
  jane.meal_choice = Some("fish".into());
  jane.phone = Some("555-0100".into());
  let s = seeded(std::slice::from_ref(&jane)).await;

  let update = GuestUpdate {
    rsvp:          Attendance::No,
    meal_choice:   None,
    song_request:  None,
    dietary_notes: None,
    general_notes: Some("sorry!".into()),
    updated_at:    Utc::now(),
  };
  let stored = s.update_guest(jane.id, &update).await.unwrap();
  assert_eq!(stored.rsvp, Some(Attendance::No));
  assert_eq!(stored.meal_choice, None);
  assert_eq!(stored.general_notes.as_deref(), Some("sorry!"));
  // Contact details are untouched.
  assert_eq!(stored.phone.as_deref(), Some("555-0100"));
  assert_eq!(s.get_guest(jane.id).await.unwrap().unwrap(), stored);
}

#[tokio::test]
async fn update_of_missing_guest_fails() {
  let s = store().await;
  let id = Uuid::new_v4();
  let update = GuestUpdate {
    rsvp:          Attendance::Yes,
    meal_choice:   Some("beef".into()),
    song_request:  None,
    dietary_notes: None,
    general_notes: None,
    updated_at:    Utc::now(),
  };
  let err = s.update_guest(id, &update).await.unwrap_err();
  assert!(matches!(err, Error::GuestNotFound(missing) if missing == id));
  assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn read_only_database_is_access_denied() {
  let jane = Guest::new("Jane", "Smith");
  let s = seeded(std::slice::from_ref(&jane)).await;
  s.conn
    .call(|conn| {
      conn.execute_batch("PRAGMA query_only = ON")?;
      Ok(())
    })
    .await
    .unwrap();

  let update = GuestUpdate {
    rsvp:          Attendance::No,
    meal_choice:   None,
    song_request:  None,
    dietary_notes: None,
    general_notes: None,
    updated_at:    Utc::now(),
  };
  let err = s.update_guest(jane.id, &update).await.unwrap_err();
  assert_eq!(err.kind(), FailureKind::AccessDenied);
}

// ─── Resolution end to end ───────────────────────────────────────────────────

#[tokio::test]
async fn resolves_couple_from_either_name() {
  let jane = Guest::new("Jane", "Smith");
  let john = linked("John", "Doe", &jane);
  let s = seeded(&[jane, john, Guest::new("Bob", "Jones")]).await;

  for input in ["jane smith", "John Doe", "Jan"] {
    let name = parse_full_name(input).unwrap();
    let found = resolve(&s, &name).await.unwrap();
    let mut got = names(&found);
    got.sort();
    assert_eq!(got, ["Jane Smith", "John Doe"], "{input}");
  }
}

#[tokio::test]
async fn query_only_database_still_resolves() {
  // query_only blocks writes, not reads.
  let s = seeded(&[Guest::new("Jane", "Smith")]).await;
  s.conn
    .call(|conn| {
      conn.execute_batch("PRAGMA query_only = ON")?;
      Ok(())
    })
    .await
    .unwrap();
  let name = parse_full_name("Jane Smith").unwrap();
  let found = resolve(&s, &name).await.unwrap();
  assert_eq!(names(&found), ["Jane Smith"]);
}

#[tokio::test]
async fn closed_store_is_a_transport_failure() {
  let s = store().await;
  s.conn.clone().close().await.unwrap();
  let name = parse_full_name("Jane Smith").unwrap();
  let err = resolve(&s, &name).await.unwrap_err();
  assert!(matches!(err, CoreError::TransportFailure(_)));
}
