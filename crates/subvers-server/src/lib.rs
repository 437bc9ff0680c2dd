//! Configuration and router assembly for the subvers HTTP server.

use std::path::{Path, PathBuf};

use axum::Router;
use serde::Deserialize;
use subvers_api::AppState;
use subvers_core::catalog::{Catalog, DEFAULT_LANGUAGES};
use subvers_store_sqlite::{SqliteStore, StoreOptions};
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SUBVERS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  /// Accepted language codes.
  pub languages:             Vec<String>,
  /// When set, only these video ids exist.
  pub known_videos:          Option<Vec<String>>,
  /// When set, only these users may author versions.
  pub known_users:           Option<Vec<String>>,
  pub max_write_attempts:    u32,
  pub writelock_expiry_secs: i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "127.0.0.1".to_owned(),
      port:                  8400,
      store_path:            PathBuf::from("subvers.sqlite3"),
      languages:             DEFAULT_LANGUAGES.iter().map(|s| (*s).to_owned()).collect(),
      known_videos:          None,
      known_users:           None,
      max_write_attempts:    3,
      writelock_expiry_secs: 60,
    }
  }
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SUBVERS")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("languages")
          .with_list_parse_key("known_videos")
          .with_list_parse_key("known_users"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn catalog(&self) -> Catalog {
    let mut catalog = Catalog::new(self.languages.iter().cloned());
    if let Some(videos) = &self.known_videos {
      catalog = catalog.with_videos(videos.iter().cloned());
    }
    if let Some(users) = &self.known_users {
      catalog = catalog.with_users(users.iter().cloned());
    }
    catalog
  }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions {
      max_write_attempts: self.max_write_attempts,
      writelock_expiry:   chrono::Duration::seconds(self.writelock_expiry_secs),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The API router with request tracing.
pub fn app(state: AppState<SqliteStore>) -> Router {
  subvers_api::api_router(state).layer(TraceLayer::new_for_http())
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
