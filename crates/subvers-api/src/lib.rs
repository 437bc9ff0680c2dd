//! JSON REST API for subvers.
//!
//! Exposes an axum [`Router`] backed by any [`SubtitleStore`]. Auth, TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", subvers_api::api_router(state))
//! ```

pub mod error;
pub mod etag;
pub mod languages;
pub mod versions;
pub mod videos;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use subvers_core::{catalog::Catalog, store::SubtitleStore};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct AppState<S: SubtitleStore> {
  pub store:   Arc<S>,
  pub catalog: Arc<Catalog>,
}

impl<S: SubtitleStore> AppState<S> {
  pub fn new(store: S, catalog: Catalog) -> Self {
    Self { store: Arc::new(store), catalog: Arc::new(catalog) }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SubtitleStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Videos
    .route(
      "/videos/{video_id}/languages",
      get(videos::list_languages::<S>).post(videos::create_language::<S>),
    )
    .route("/videos/{video_id}/history.dot", get(videos::history_dot::<S>))
    // Languages
    .route("/languages/{id}", get(languages::get_one::<S>))
    .route("/languages/{id}/summary", get(languages::summary::<S>))
    .route("/languages/{id}/tip", get(languages::tip::<S>))
    .route(
      "/languages/{id}/versions",
      get(languages::list_versions::<S>).post(languages::add_version::<S>),
    )
    .route(
      "/languages/{id}/writelock",
      post(languages::acquire_writelock::<S>).delete(languages::release_writelock::<S>),
    )
    .route("/languages/{id}/collaborators", get(languages::list_collaborators::<S>))
    .route(
      "/languages/{id}/collaborators/{user_id}",
      put(languages::save_collaborator::<S>),
    )
    .route("/languages/{id}/signoffs", post(languages::recompute_signoffs::<S>))
    // Versions
    .route("/versions/{id}", get(versions::get_one::<S>))
    .route("/versions/{id}/subtitles", get(versions::subtitles::<S>))
    .route("/versions/{id}/ancestors", get(versions::ancestors::<S>))
    .route("/versions/{id}/visibility", put(versions::set_visibility::<S>))
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
