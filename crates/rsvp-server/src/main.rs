//! rsvp-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! configured guest store, and serves the RSVP API over HTTP.
//!
//! # Seeding the SQLite store
//!
//! ```
//! cargo run -p rsvp-server -- --import guests.json
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use clap::Parser;
use rsvp_core::store::GuestStore;
use rsvp_server::{Backend, GuestFile, ServerConfig, expand_tilde};
use rsvp_store_postgrest::PostgrestStore;
use rsvp_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Wedding RSVP server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Insert the guests from a `{"guests": [...]}` JSON file into the SQLite
  /// store and exit.
  #[arg(long, value_name = "FILE")]
  import: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  match cfg.store {
    Backend::Sqlite => {
      let path = expand_tilde(&cfg.sqlite_path);
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;

      // Helper mode: seed the guest list and exit.
      if let Some(file) = cli.import {
        let guests = GuestFile::read(&file)?.guests;
        let count = store
          .insert_guests(&guests)
          .await
          .context("failed to import guests")?;
        info!(count, path = ?path, "imported guests");
        return Ok(());
      }

      serve(&cfg, store).await
    }
    Backend::Postgrest => {
      if cli.import.is_some() {
        bail!("--import only works with the sqlite store");
      }
      let pg = cfg.postgrest()?;
      let store = PostgrestStore::new(&pg).context("failed to build PostgREST client")?;
      info!(url = %pg.url, table = %pg.table, "using PostgREST guest table");
      serve(&cfg, store).await
    }
  }
}

async fn serve<S>(cfg: &ServerConfig, store: S) -> anyhow::Result<()>
where
  S: GuestStore + 'static,
{
  let app = rsvp_server::app(Arc::new(store), cfg.session_ttl());
  let address = cfg.address();

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
