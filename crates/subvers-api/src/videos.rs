//! Handlers for `/videos` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/videos/:video_id/languages` | Optional `?filter=having_versions\|having_public_versions` |
//! | `POST` | `/videos/:video_id/languages` | Body: `{"language_code":"en"}`; idempotent |
//! | `GET`  | `/videos/:video_id/history.dot` | Graphviz source |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::header,
  response::IntoResponse,
};
use serde::Deserialize;
use subvers_core::{
  language::{BranchFilter, SubtitleLanguage},
  store::SubtitleStore,
};

use crate::{AppState, error::ApiError};

// ─── Languages ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub filter: BranchFilter,
}

/// `GET /videos/:video_id/languages[?filter=..]`
pub async fn list_languages<S>(
  State(state): State<AppState<S>>,
  Path(video_id): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SubtitleLanguage>>, ApiError>
where
  S: SubtitleStore,
{
  let branches = state
    .store
    .list_branches(&video_id, params.filter)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(branches))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub language_code: String,
}

/// `POST /videos/:video_id/languages`
pub async fn create_language<S>(
  State(state): State<AppState<S>>,
  Path(video_id): Path<String>,
  Json(body): Json<CreateBody>,
) -> Result<Json<SubtitleLanguage>, ApiError>
where
  S: SubtitleStore,
{
  state.catalog.check_video(&video_id).map_err(ApiError::classified)?;
  let code = state
    .catalog
    .language(&body.language_code)
    .map_err(ApiError::classified)?;

  let branch = state
    .store
    .create_or_get_branch(&video_id, &code)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(branch))
}

// ─── History ─────────────────────────────────────────────────────────────────

/// `GET /videos/:video_id/history.dot`
pub async fn history_dot<S>(
  State(state): State<AppState<S>>,
  Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubtitleStore,
{
  let history = state
    .store
    .video_history(&video_id)
    .await
    .map_err(ApiError::classified)?;
  Ok(([(header::CONTENT_TYPE, "text/vnd.graphviz")], history.to_dot()))
}
