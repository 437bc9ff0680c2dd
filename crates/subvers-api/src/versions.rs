//! Handlers for `/versions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/versions/:id` | 404 if not found |
//! | `GET`  | `/versions/:id/subtitles` | Decoded document; `?format=dfxp` for markup. ETag + `If-None-Match` |
//! | `GET`  | `/versions/:id/ancestors` | Debug walk of every ancestor |
//! | `PUT`  | `/versions/:id/visibility` | Body: `{"visibility":"private","visibility_override":null}` |

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use subvers_core::{
  store::SubtitleStore,
  version::{SubtitleVersion, Visibility},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, etag};

async fn require_version<S: SubtitleStore>(
  state: &AppState<S>,
  id: Uuid,
) -> Result<SubtitleVersion, ApiError> {
  state
    .store
    .get_version(id)
    .await
    .map_err(ApiError::classified)?
    .ok_or_else(|| ApiError::NotFound(format!("subtitle version {id}")))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /versions/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SubtitleVersion>, ApiError>
where
  S: SubtitleStore,
{
  Ok(Json(require_version(&state, id).await?))
}

// ─── Subtitles ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
  #[default]
  Json,
  Dfxp,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubtitleParams {
  #[serde(default)]
  pub format: Format,
}

/// `GET /versions/:id/subtitles[?format=json|dfxp]`
pub async fn subtitles<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<SubtitleParams>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: SubtitleStore,
{
  let version = require_version(&state, id).await?;
  let tag = etag::compute_etag(&version.serialized_subtitles);

  if let Some(inm) = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok())
    && etag::matches(inm, &tag)
  {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, tag)]).into_response());
  }

  let document = subvers_dfxp::subtitles(&version).map_err(ApiError::classified)?;
  let response = match params.format {
    Format::Json => ([(header::ETAG, tag)], Json(document)).into_response(),
    Format::Dfxp => {
      let markup = subvers_dfxp::to_markup(document).map_err(ApiError::classified)?;
      (
        [
          (header::ETAG, tag),
          (header::CONTENT_TYPE, "application/ttml+xml".to_owned()),
        ],
        markup,
      )
        .into_response()
    }
  };
  Ok(response)
}

// ─── Ancestors ───────────────────────────────────────────────────────────────

/// `GET /versions/:id/ancestors`
pub async fn ancestors<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<BTreeSet<Uuid>>, ApiError>
where
  S: SubtitleStore,
{
  let found = state
    .store
    .get_ancestors_debug(id)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(found))
}

// ─── Visibility ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VisibilityBody {
  pub visibility:          String,
  #[serde(default)]
  pub visibility_override: Option<String>,
}

/// `PUT /versions/:id/visibility`
pub async fn set_visibility<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<VisibilityBody>,
) -> Result<Json<SubtitleVersion>, ApiError>
where
  S: SubtitleStore,
{
  let visibility = Visibility::parse(&body.visibility).map_err(ApiError::classified)?;
  let visibility_override = body
    .visibility_override
    .as_deref()
    .map(Visibility::parse)
    .transpose()
    .map_err(ApiError::classified)?;

  let version = state
    .store
    .set_visibility(id, visibility, visibility_override)
    .await
    .map_err(ApiError::classified)?;
  Ok(Json(version))
}
