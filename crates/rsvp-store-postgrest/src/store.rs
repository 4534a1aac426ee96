//! [`PostgrestStore`]: a [`GuestStore`] over a PostgREST endpoint.

use std::time::Duration;

use reqwest::{
  Client, RequestBuilder,
  header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use rsvp_core::{
  guest::{Guest, GuestUpdate},
  store::{GuestFilter, GuestStore},
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  query::{Plan, plan},
};

/// Connection settings for the hosted guest table.
#[derive(Debug, Clone, Deserialize)]
pub struct PostgrestConfig {
  /// Base URL of the PostgREST API, e.g. `https://<project>.supabase.co/rest/v1`.
  pub url:     String,
  /// Anonymous (or service) key, sent as `apikey` and as a bearer token.
  pub api_key: String,
  #[serde(default = "default_table")]
  pub table:   String,
}

fn default_table() -> String { "guests".to_owned() }

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct PostgrestStore {
  client: Client,
  base:   String,
}

impl PostgrestStore {
  pub fn new(config: &PostgrestConfig) -> Result<Self> {
    let key = HeaderValue::from_str(&config.api_key).map_err(|_| Error::InvalidKey)?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
      .map_err(|_| Error::InvalidKey)?;

    let mut headers = HeaderMap::new();
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);

    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .default_headers(headers)
      .build()?;

    Ok(Self {
      client,
      base: format!("{}/{}", config.url.trim_end_matches('/'), config.table),
    })
  }

  async fn rows(&self, req: RequestBuilder) -> Result<Vec<Guest>> {
    let resp = req.send().await?;
    if !resp.status().is_success() {
      return Err(Error::from_response(resp).await);
    }
    Ok(resp.json().await?)
  }

  /// `GET /<table>?select=*&<params>`
  async fn select(&self, params: &[(String, String)]) -> Result<Vec<Guest>> {
    let req = self
      .client
      .get(&self.base)
      .query(&[("select", "*")])
      .query(params);
    self.rows(req).await
  }
}

impl GuestStore for PostgrestStore {
  type Error = Error;

  async fn find_guests(&self, filter: &GuestFilter) -> Result<Vec<Guest>> {
    match plan(filter) {
      Plan::Remote(params) => self.select(&params).await,
      Plan::Local => {
        let all = self.select(&[]).await?;
        debug!(rows = all.len(), ?filter, "filtering guest list locally");
        Ok(all.into_iter().filter(|g| filter.matches(g)).collect())
      }
    }
  }

  async fn get_guest(&self, id: Uuid) -> Result<Option<Guest>> {
    let rows = self
      .select(&[("id".to_owned(), format!("eq.{id}"))])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn guests_linked_to(&self, id: Uuid) -> Result<Vec<Guest>> {
    self
      .select(&[("plus_one_id".to_owned(), format!("eq.{id}"))])
      .await
  }

  /// `PATCH /<table>?id=eq.<id>` returning the updated row. Row-level
  /// security that hides the row makes this indistinguishable from a
  /// missing guest.
  async fn update_guest(&self, id: Uuid, update: &GuestUpdate) -> Result<Guest> {
    let req = self
      .client
      .patch(&self.base)
      .query(&[("id", format!("eq.{id}"))])
      .header("Prefer", "return=representation")
      .json(update);
    self
      .rows(req)
      .await?
      .into_iter()
      .next()
      .ok_or(Error::GuestNotFound(id))
  }
}
