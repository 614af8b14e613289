//! salesops server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) overlaid with
//! `SALESOPS_*` environment variables, opens the configured store, and serves
//! the dashboard API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash`:
//!
//! ```text
//! cargo run -p salesops-server --bin server -- hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use salesops_api::ApiState;
use salesops_core::store::SalesStore;
use salesops_providers::{PostgrestConfig, PostgrestStore, ZoomPhoneClient, ZoomPhoneConfig};
use salesops_server::{
  AppState, ServerConfig, StoreBackend,
  auth::{AuthConfig, hash_password},
  session::SessionRegistry,
};
use salesops_store_sqlite::{Snapshot, SqliteStore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Sales dashboard API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Load a JSON table export into the SQLite store.
  Import {
    /// Path to the snapshot file.
    snapshot: PathBuf,
  },
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
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

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => {
      let password = read_password()?;
      let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
      println!("{hash}");
      Ok(())
    }
    Command::Import { snapshot } => {
      let cfg = load_config(&cli.config)?;
      import(&cfg, &snapshot).await
    }
    Command::Serve => {
      let cfg = load_config(&cli.config)?;
      match cfg.store.backend {
        StoreBackend::Sqlite => {
          let path = expand_tilde(&cfg.store.sqlite_path);
          let store = SqliteStore::open(&path)
            .await
            .with_context(|| format!("failed to open store at {path:?}"))?;
          serve(store, cfg).await
        }
        StoreBackend::Postgrest => {
          // `validate` has checked both are present.
          let store = PostgrestStore::new(PostgrestConfig::new(
            cfg.store.postgrest_url.clone().unwrap_or_default(),
            cfg.store.postgrest_api_key.clone().unwrap_or_default(),
          ))
          .context("failed to build postgrest client")?;
          serve(store, cfg).await
        }
      }
    }
  }
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let cfg = ServerConfig::load(path).context("failed to read configuration")?;
  cfg.validate()?;
  Ok(cfg)
}

async fn serve<S: SalesStore + 'static>(store: S, cfg: ServerConfig) -> anyhow::Result<()> {
  let (telephony, lookback_days) = match &cfg.telephony {
    Some(t) => {
      let client = ZoomPhoneClient::new(ZoomPhoneConfig::new(&t.base_url, &t.api_token))
        .context("failed to build telephony client")?;
      (Some(Arc::new(client)), t.lookback_days)
    }
    None => {
      tracing::warn!("no telephony configured; attribution is disabled");
      (None, salesops_core::attribution::LOOKBACK_DAYS)
    }
  };

  let api = ApiState::new(Arc::new(store), telephony).with_lookback_days(lookback_days);
  let state = AppState {
    auth:     Arc::new(AuthConfig {
      username:      cfg.auth_username.clone(),
      password_hash: cfg.auth_password_hash.clone(),
    }),
    sessions: SessionRegistry::new(chrono::Duration::minutes(cfg.session_ttl_minutes)),
  };

  let app = salesops_server::router(state, api);
  let address = cfg.address();

  tracing::info!(backend = ?cfg.store.backend, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn import(cfg: &ServerConfig, snapshot: &Path) -> anyhow::Result<()> {
  if cfg.store.backend != StoreBackend::Sqlite {
    anyhow::bail!("import writes to the sqlite store; set store.backend = \"sqlite\"");
  }
  let path = expand_tilde(&cfg.store.sqlite_path);
  let store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))?;
  let rows = Snapshot::read(snapshot)
    .await
    .with_context(|| format!("failed to read snapshot {snapshot:?}"))?;
  let summary = store.import(rows).await.context("import failed")?;
  println!(
    "imported {} calls, {} outcomes, {} setters, {} closers",
    summary.calls, summary.outcome_log, summary.setters, summary.closers
  );
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
