//! Tests against a throwaway HTTP server standing in for PostgREST.

use std::sync::{Arc, Mutex};

use axum::{
  Json, Router,
  extract::{Query, State},
  http::{HeaderMap, Method, StatusCode, Uri},
};
use chrono::Utc;
use rsvp_core::{
  guest::{Attendance, GuestUpdate},
  store::{FailureKind, GuestFilter, GuestStore, NamePattern, StoreError},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{Error, PostgrestConfig, PostgrestStore};

// ─── Mock endpoint ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Recorded {
  method:  Method,
  path:    String,
  query:   Vec<(String, String)>,
  headers: HeaderMap,
  body:    String,
}

#[derive(Clone)]
struct Mock {
  reply:    Arc<Mutex<(StatusCode, Value)>>,
  requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Mock {
  fn new(status: StatusCode, body: Value) -> Self {
    Self {
      reply:    Arc::new(Mutex::new((status, body))),
      requests: Arc::default(),
    }
  }

  fn last(&self) -> Recorded {
    self.requests.lock().unwrap().last().cloned().expect("no request")
  }
}

async fn record(
  State(mock): State<Mock>,
  method: Method,
  uri: Uri,
  Query(query): Query<Vec<(String, String)>>,
  headers: HeaderMap,
  body: String,
) -> (StatusCode, Json<Value>) {
  mock.requests.lock().unwrap().push(Recorded {
    method,
    path: uri.path().to_owned(),
    query,
    headers,
    body,
  });
  let (status, body) = mock.reply.lock().unwrap().clone();
  (status, Json(body))
}

async fn serve(mock: &Mock) -> PostgrestStore {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let app = Router::new().fallback(record).with_state(mock.clone());
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

  PostgrestStore::new(&PostgrestConfig {
    url:     format!("http://{addr}/rest/v1/"),
    api_key: "anon-key".into(),
    table:   "guests".into(),
  })
  .unwrap()
}

fn row(id: Uuid, first: &str, last: Value) -> Value {
  json!({
    "id": id,
    "first_name": first,
    "last_name": last,
    "plus_one_id": null,
    "rsvp": "",
    "created_at": "2024-05-01T12:00:00+00:00",
  })
}

fn param<'a>(r: &'a Recorded, key: &str) -> Option<&'a str> {
  r.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_sends_ilike_filters_and_keys() {
  let id = Uuid::new_v4();
  let mock = Mock::new(StatusCode::OK, json!([row(id, "Jane", json!("Smith"))]));
  let store = serve(&mock).await;

  let found = store
    .find_guests(&GuestFilter::Name {
      first: NamePattern::Exact("Jane".into()),
      last:  Some(NamePattern::Exact("Smith".into())),
    })
    .await
    .unwrap();

  assert_eq!(found.len(), 1);
  assert_eq!(found[0].id, id);
  assert_eq!(found[0].rsvp, None);

  let req = mock.last();
  assert_eq!(req.method, Method::GET);
  assert_eq!(req.path, "/rest/v1/guests");
  assert_eq!(param(&req, "select"), Some("*"));
  assert_eq!(param(&req, "first_name"), Some("ilike.Jane"));
  assert_eq!(param(&req, "last_name"), Some("ilike.Smith"));
  assert_eq!(req.headers["apikey"], "anon-key");
  assert_eq!(req.headers["authorization"], "Bearer anon-key");
}

#[tokio::test]
async fn either_name_is_sent_as_or_list() {
  let mock = Mock::new(StatusCode::OK, json!([]));
  let store = serve(&mock).await;

  store
    .find_guests(&GuestFilter::EitherName(NamePattern::Contains("ann".into())))
    .await
    .unwrap();

  assert_eq!(
    param(&mock.last(), "or"),
    Some("(first_name.ilike.\"*ann*\",last_name.ilike.\"*ann*\")")
  );
}

#[tokio::test]
async fn contained_in_filters_full_table_locally() {
  let mock = Mock::new(
    StatusCode::OK,
    json!([
      row(Uuid::new_v4(), "Jo", json!(null)),
      row(Uuid::new_v4(), "Cher", json!("")),
      row(Uuid::new_v4(), "Bob", json!("Anne")),
    ]),
  );
  let store = serve(&mock).await;

  let found = store
    .find_guests(&GuestFilter::EitherName(NamePattern::ContainedIn(
      "Joanne".into(),
    )))
    .await
    .unwrap();

  let names: Vec<_> = found.iter().map(|g| g.full_name()).collect();
  assert_eq!(names, ["Jo", "Bob Anne"]);
  let req = mock.last();
  assert_eq!(req.query, [("select".to_owned(), "*".to_owned())]);
}

#[tokio::test]
async fn get_guest_by_id() {
  let id = Uuid::new_v4();
  let mock = Mock::new(StatusCode::OK, json!([]));
  let store = serve(&mock).await;

  assert!(store.get_guest(id).await.unwrap().is_none());
  assert_eq!(param(&mock.last(), "id"), Some(format!("eq.{id}").as_str()));
}

#[tokio::test]
async fn linked_guests_query_plus_one_column() {
  let id = Uuid::new_v4();
  let mock = Mock::new(StatusCode::OK, json!([row(Uuid::new_v4(), "John", json!("Doe"))]));
  let store = serve(&mock).await;

  let found = store.guests_linked_to(id).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(
    param(&mock.last(), "plus_one_id"),
    Some(format!("eq.{id}").as_str())
  );
}

// ─── Updates ─────────────────────────────────────────────────────────────────

fn update() -> GuestUpdate {
  GuestUpdate {
    rsvp:          Attendance::Yes,
    meal_choice:   Some("fish".into()),
    song_request:  None,
    dietary_notes: None,
    general_notes: None,
    updated_at:    Utc::now(),
  }
}

#[tokio::test]
async fn update_patches_by_id_and_returns_row() {
  let id = Uuid::new_v4();
  let mut stored = row(id, "Jane", json!("Smith"));
  stored["rsvp"] = json!("yes");
  stored["meal_choice"] = json!("fish");
  let mock = Mock::new(StatusCode::OK, json!([stored]));
  let store = serve(&mock).await;

  let guest = store.update_guest(id, &update()).await.unwrap();
  assert_eq!(guest.rsvp, Some(Attendance::Yes));
  assert_eq!(guest.meal_choice.as_deref(), Some("fish"));

  let req = mock.last();
  assert_eq!(req.method, Method::PATCH);
  assert_eq!(param(&req, "id"), Some(format!("eq.{id}").as_str()));
  assert_eq!(req.headers["prefer"], "return=representation");
  let body: Value = serde_json::from_str(&req.body).unwrap();
  assert_eq!(body["rsvp"], "yes");
  assert_eq!(body["meal_choice"], "fish");
  // Cleared fields are sent as explicit nulls.
  assert!(body["song_request"].is_null());
  assert!(body.as_object().unwrap().contains_key("song_request"));
}

#[tokio::test]
async fn update_matching_no_row_is_not_found() {
  let id = Uuid::new_v4();
  let mock = Mock::new(StatusCode::OK, json!([]));
  let store = serve(&mock).await;

  let err = store.update_guest(id, &update()).await.unwrap_err();
  assert!(matches!(err, Error::GuestNotFound(missing) if missing == id));
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unauthorized_is_access_denied() {
  let mock = Mock::new(
    StatusCode::UNAUTHORIZED,
    json!({ "code": "PGRST301", "message": "JWT expired" }),
  );
  let store = serve(&mock).await;

  let err = store.get_guest(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), FailureKind::AccessDenied);
  assert!(err.to_string().contains("JWT expired"));
}

#[tokio::test]
async fn insufficient_privilege_is_access_denied() {
  let mock = Mock::new(
    StatusCode::BAD_REQUEST,
    json!({ "code": "42501", "message": "permission denied for table guests" }),
  );
  let store = serve(&mock).await;

  let err = store.update_guest(Uuid::new_v4(), &update()).await.unwrap_err();
  assert_eq!(err.kind(), FailureKind::AccessDenied);
}

#[tokio::test]
async fn server_error_is_transport_failure() {
  let mock = Mock::new(StatusCode::SERVICE_UNAVAILABLE, json!("upstream down"));
  let store = serve(&mock).await;

  let err = store.guests_linked_to(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_failure() {
  // Bind then drop to get a port nothing listens on.
  let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let store = PostgrestStore::new(&PostgrestConfig {
    url:     format!("http://{addr}"),
    api_key: "anon-key".into(),
    table:   "guests".into(),
  })
  .unwrap();

  let err = store.get_guest(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Http(_)));
  assert_eq!(err.kind(), FailureKind::Transport);
}

#[test]
fn key_with_newline_is_rejected() {
  let err = PostgrestStore::new(&PostgrestConfig {
    url:     "http://localhost".into(),
    api_key: "bad\nkey".into(),
    table:   "guests".into(),
  })
  .err()
  .unwrap();
  assert!(matches!(err, Error::InvalidKey));
}
