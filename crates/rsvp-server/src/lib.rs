//! Configuration and router assembly for the RSVP server binary.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context as _, bail};
use axum::Router;
use rsvp_api::Sessions;
use rsvp_core::{guest::Guest, store::GuestStore};
use rsvp_store_postgrest::PostgrestConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Which guest store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  Sqlite,
  Postgrest,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `RSVP_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_backend")]
  pub store:            Backend,
  #[serde(default = "default_sqlite_path")]
  pub sqlite_path:      PathBuf,
  #[serde(default)]
  pub postgrest_url:    Option<String>,
  #[serde(default)]
  pub postgrest_key:    Option<String>,
  #[serde(default = "default_table")]
  pub postgrest_table:  String,
  /// Seconds a wizard session may sit idle before it is discarded.
  #[serde(default = "default_session_ttl_secs")]
  pub session_ttl_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_backend() -> Backend { Backend::Sqlite }
fn default_sqlite_path() -> PathBuf { PathBuf::from("guests.db") }
fn default_table() -> String { "guests".to_owned() }
fn default_session_ttl_secs() -> u64 { rsvp_api::DEFAULT_SESSION_TTL.as_secs() }

impl ServerConfig {
  /// Load from an optional TOML file, overridden by `RSVP_*` variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("RSVP"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn session_ttl(&self) -> Duration {
    Duration::from_secs(self.session_ttl_secs)
  }

  /// The PostgREST settings; both the URL and the key are required.
  pub fn postgrest(&self) -> anyhow::Result<PostgrestConfig> {
    let (Some(url), Some(api_key)) = (&self.postgrest_url, &self.postgrest_key)
    else {
      bail!("store = \"postgrest\" needs postgrest_url and postgrest_key");
    };
    Ok(PostgrestConfig {
      url:     url.clone(),
      api_key: api_key.clone(),
      table:   self.postgrest_table.clone(),
    })
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// The seed file shape: `{"guests": [ ... ]}`.
#[derive(Debug, Deserialize)]
pub struct GuestFile {
  pub guests: Vec<Guest>,
}

impl GuestFile {
  pub fn read(path: &Path) -> anyhow::Result<Self> {
    let text = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {path:?}"))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {path:?}"))
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, with request tracing.
/// Sessions idle for longer than `session_ttl` are dropped.
pub fn app<S>(store: Arc<S>, session_ttl: Duration) -> Router
where
  S: GuestStore + 'static,
{
  let sessions = Sessions::new(session_ttl);
  Router::new()
    .nest("/api", rsvp_api::api_router_with_sessions(store, sessions))
    .layer(TraceLayer::new_for_http())
}
