//! Handlers for `/languages` endpoints, i.e. branches and what hangs off them.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/languages/:id` | 404 if not found |
//! | `GET`    | `/languages/:id/summary` | Version count plus the tip's title, description and item count |
//! | `GET`    | `/languages/:id/tip` | 404 if the branch has no versions |
//! | `GET`    | `/languages/:id/versions` | Optional `?public_only=true` |
//! | `POST`   | `/languages/:id/versions` | Commit a new version |
//! | `POST`   | `/languages/:id/writelock` | Body: `{"owner":"..","session_key":".."}` |
//! | `DELETE` | `/languages/:id/writelock` | `?session_key=..` |
//! | `GET`    | `/languages/:id/collaborators` | |
//! | `PUT`    | `/languages/:id/collaborators/:user_id` | Body: collaborator state |
//! | `POST`   | `/languages/:id/signoffs` | Recount signoffs |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use subvers_core::{
  collaborator::{Collaborator, CollaboratorState, SignoffCounts},
  document::{SubtitleContent, text_field},
  language::{BranchSummary, SubtitleLanguage},
  store::SubtitleStore,
  version::{NewVersion, SubtitleVersion, Visibility},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Branch ──────────────────────────────────────────────────────────────────

/// `GET /languages/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SubtitleLanguage>, ApiError>
where
  S: SubtitleStore,
{
  let branch = state
    .store
    .get_branch_by_id(id)
    .await
    .map_err(ApiError::classified)?
    .ok_or_else(|| ApiError::NotFound(format!("subtitle language {id}")))?;
  Ok(Json(branch))
}

/// `GET /languages/:id/summary`
pub async fn summary<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<BranchSummary>, ApiError>
where
  S: SubtitleStore,
{
  let summary = state
    .store
    .branch_summary(id)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(summary))
}

/// `GET /languages/:id/tip`
pub async fn tip<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SubtitleVersion>, ApiError>
where
  S: SubtitleStore,
{
  let tip = state
    .store
    .get_tip(id)
    .await
    .map_err(ApiError::classified)?
    .ok_or_else(|| ApiError::NotFound(format!("tip of subtitle language {id}")))?;
  Ok(Json(tip))
}

// ─── Versions ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub public_only: bool,
}

/// `GET /languages/:id/versions[?public_only=true]`
pub async fn list_versions<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SubtitleVersion>>, ApiError>
where
  S: SubtitleStore,
{
  let versions = state
    .store
    .list_versions(id, params.public_only)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(versions))
}

/// Body of `POST /languages/:id/versions`.
///
/// `subtitles` may be `null`, a markup string, a document object or an array
/// of `[start, end, text]` tuples. Text fields are taken as raw JSON so a
/// wrongly typed value is reported as a rule violation rather than a parse
/// failure.
#[derive(Debug, Deserialize)]
pub struct AddVersionBody {
  #[serde(default)]
  pub subtitles:   Value,
  #[serde(default)]
  pub author:      Option<String>,
  #[serde(default)]
  pub parents:     Vec<Uuid>,
  #[serde(default)]
  pub title:       Option<Value>,
  #[serde(default)]
  pub description: Option<Value>,
  #[serde(default)]
  pub note:        Option<Value>,
  #[serde(default)]
  pub visibility:  Option<String>,
}

/// `POST /languages/:id/versions`
pub async fn add_version<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AddVersionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubtitleStore,
{
  let input = NewVersion {
    subtitles:   SubtitleContent::from_json(body.subtitles).map_err(ApiError::classified)?,
    author:      state
      .catalog
      .author(body.author.as_deref())
      .map_err(ApiError::classified)?,
    parents:     body.parents,
    title:       text_field("title", body.title).map_err(ApiError::classified)?,
    description: text_field("description", body.description).map_err(ApiError::classified)?,
    note:        text_field("note", body.note).map_err(ApiError::classified)?,
    visibility:  body
      .visibility
      .as_deref()
      .map(Visibility::parse)
      .transpose()
      .map_err(ApiError::classified)?
      .unwrap_or_default(),
  };

  let version = state
    .store
    .add_version(id, input)
    .await
    .map_err(ApiError::classified)?;
  Ok((StatusCode::CREATED, Json(version)))
}

// ─── Write-locks ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AcquireBody {
  pub owner:       String,
  pub session_key: String,
}

/// `POST /languages/:id/writelock`
pub async fn acquire_writelock<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AcquireBody>,
) -> Result<Json<SubtitleLanguage>, ApiError>
where
  S: SubtitleStore,
{
  let branch = state
    .store
    .acquire_writelock(id, &body.owner, &body.session_key)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(branch))
}

#[derive(Debug, Deserialize)]
pub struct ReleaseParams {
  pub session_key: String,
}

/// `DELETE /languages/:id/writelock?session_key=..`
pub async fn release_writelock<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ReleaseParams>,
) -> Result<Json<SubtitleLanguage>, ApiError>
where
  S: SubtitleStore,
{
  let branch = state
    .store
    .release_writelock(id, &params.session_key)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(branch))
}

// ─── Collaborators ───────────────────────────────────────────────────────────

/// `GET /languages/:id/collaborators`
pub async fn list_collaborators<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Collaborator>>, ApiError>
where
  S: SubtitleStore,
{
  let collaborators = state
    .store
    .list_collaborators(id)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(collaborators))
}

/// `PUT /languages/:id/collaborators/:user_id`
pub async fn save_collaborator<S>(
  State(state): State<AppState<S>>,
  Path((id, user_id)): Path<(Uuid, String)>,
  Json(body): Json<CollaboratorState>,
) -> Result<Json<Collaborator>, ApiError>
where
  S: SubtitleStore,
{
  let user = state
    .catalog
    .author(Some(&user_id))
    .map_err(ApiError::classified)?;

  let collaborator = state
    .store
    .save_collaborator(id, &user, body)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(collaborator))
}

/// `POST /languages/:id/signoffs`
pub async fn recompute_signoffs<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SignoffCounts>, ApiError>
where
  S: SubtitleStore,
{
  let counts = state
    .store
    .recompute_signoffs(id)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(counts))
}
