//! SubtitleVersion, an immutable commit on a subtitle branch.
//!
//! Once persisted, a version's subtitles, parents, lineage and number never
//! change. Only the visibility fields may be updated afterwards, so teams can
//! publish or unpublish work.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  document::{SubtitleContent, SubtitleDocument},
  lineage::Lineage,
};

// ─── Visibility ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  #[default]
  Public,
  Private,
}

impl Visibility {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Public => "public",
      Self::Private => "private",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "public" => Ok(Self::Public),
      "private" => Ok(Self::Private),
      other => Err(Error::UnknownVisibility(other.to_owned())),
    }
  }
}

// ─── SubtitleVersion ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleVersion {
  pub version_id:           Uuid,
  /// The branch this version was committed on.
  pub language_id:          Uuid,
  pub video_id:             String,
  pub language_code:        String,
  /// 1-based, dense per branch.
  pub version_number:       u32,
  /// Direct DAG edges; at most one per language.
  pub parent_ids:           Vec<Uuid>,
  pub lineage:              Lineage,
  pub visibility:           Visibility,
  /// Set by team admins; takes precedence over `visibility` without
  /// changing it.
  pub visibility_override:  Option<Visibility>,
  pub author:               String,
  pub title:                String,
  pub description:          String,
  pub note:                 String,
  /// Stamped by the store when the version is added.
  pub created_at:           DateTime<Utc>,
  /// Compressed canonical markup. Use `subvers_dfxp::subtitles` to read it.
  pub serialized_subtitles: String,
  #[serde(skip)]
  subtitles:                OnceCell<SubtitleDocument>,
}

impl SubtitleVersion {
  /// Assemble a version from its persisted fields. The decoded-document
  /// cache starts empty.
  #[allow(clippy::too_many_arguments)]
  pub fn from_parts(
    version_id: Uuid,
    language_id: Uuid,
    video_id: String,
    language_code: String,
    version_number: u32,
    parent_ids: Vec<Uuid>,
    lineage: Lineage,
    visibility: Visibility,
    visibility_override: Option<Visibility>,
    author: String,
    title: String,
    description: String,
    note: String,
    created_at: DateTime<Utc>,
    serialized_subtitles: String,
  ) -> Self {
    Self {
      version_id,
      language_id,
      video_id,
      language_code,
      version_number,
      parent_ids,
      lineage,
      visibility,
      visibility_override,
      author,
      title,
      description,
      note,
      created_at,
      serialized_subtitles,
      subtitles: OnceCell::new(),
    }
  }

  /// The visibility that actually applies: the override when set.
  pub fn effective_visibility(&self) -> Visibility {
    self.visibility_override.unwrap_or(self.visibility)
  }

  pub fn is_public(&self) -> bool {
    self.effective_visibility() == Visibility::Public
  }

  /// Decoded subtitles, decoding with `decode` on first access only.
  pub fn subtitles_with<F, E>(&self, decode: F) -> Result<&SubtitleDocument, E>
  where
    F: FnOnce(&str) -> Result<SubtitleDocument, E>,
  {
    self
      .subtitles
      .get_or_try_init(|| decode(&self.serialized_subtitles))
  }

  /// Replace the stored subtitles. `serialized` must be the encoding of
  /// `document`; the cache is reset to `document`.
  pub fn set_subtitles(&mut self, serialized: String, document: SubtitleDocument) {
    self.serialized_subtitles = serialized;
    self.subtitles = OnceCell::with_value(document);
  }

  /// Whether the decoded document is currently cached.
  pub fn has_cached_subtitles(&self) -> bool { self.subtitles.get().is_some() }
}

// ─── NewVersion ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::SubtitleStore::add_version`]. Version number,
/// lineage, creation time and the tip parent are always computed by the
/// store.
#[derive(Debug, Clone)]
pub struct NewVersion {
  pub subtitles:   SubtitleContent,
  pub author:      String,
  /// Explicit parents in addition to the branch tip.
  pub parents:     Vec<Uuid>,
  pub title:       Option<String>,
  pub description: Option<String>,
  pub note:        Option<String>,
  pub visibility:  Visibility,
}

impl NewVersion {
  pub fn new(subtitles: SubtitleContent, author: impl Into<String>) -> Self {
    Self {
      subtitles,
      author: author.into(),
      parents: Vec::new(),
      title: None,
      description: None,
      note: None,
      visibility: Visibility::default(),
    }
  }

  pub fn with_parents(mut self, parents: impl IntoIterator<Item = Uuid>) -> Self {
    self.parents.extend(parents);
    self
  }
}

// ─── Test helpers ────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
  use super::{test_helpers::version, *};
  use crate::document::{SubtitleDocument, SubtitleItem};

  #[test]
  fn override_takes_precedence() {
    let mut v = version("en", 1, Lineage::new());
    assert!(v.is_public());

    v.visibility = Visibility::Private;
    assert!(!v.is_public());

    v.visibility_override = Some(Visibility::Public);
    assert!(v.is_public());
    assert_eq!(v.visibility, Visibility::Private);

    v.visibility = Visibility::Public;
    v.visibility_override = Some(Visibility::Private);
    assert!(!v.is_public());
  }

  #[test]
  fn decode_runs_once_until_reset() {
    let mut v = version("en", 1, Lineage::new());
    let mut calls = 0;

    let doc = v
      .subtitles_with(|_| {
        calls += 1;
        Ok::<_, Error>(SubtitleDocument::new("en"))
      })
      .unwrap();
    assert!(doc.is_empty());
    assert!(v.has_cached_subtitles());

    v.subtitles_with(|_| {
      calls += 1;
      Ok::<_, Error>(SubtitleDocument::new("en"))
    })
    .unwrap();
    assert_eq!(calls, 1);

    let replaced = SubtitleDocument::from_items("en", [SubtitleItem::new(
      Some(0),
      Some(1000),
      "Hello",
    )]);
    v.set_subtitles("blob".into(), replaced);
    let doc = v
      .subtitles_with(|_| -> Result<SubtitleDocument> { panic!("cache was reset") })
      .unwrap();
    assert_eq!(doc.len(), 1);
    assert_eq!(v.serialized_subtitles, "blob");
  }

  #[test]
  fn visibility_strings() {
    assert_eq!(Visibility::parse("private").unwrap(), Visibility::Private);
    assert_eq!(Visibility::Public.as_str(), "public");
    assert!(matches!(
      Visibility::parse("hidden"),
      Err(Error::UnknownVisibility(_))
    ));
  }
}
