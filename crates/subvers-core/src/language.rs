//! SubtitleLanguage, a branch of subtitle history for one (video, language).
//!
//! Branches exist mostly to coordinate access to a language among users; the
//! subtitles themselves live in the versions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collaborator::SignoffCounts;

/// Advisory, user-facing editing exclusivity. This is not a transactional
/// lock; version numbering never relies on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteLock {
  pub owner:       String,
  pub session_key: String,
  pub acquired_at: DateTime<Utc>,
}

impl WriteLock {
  pub fn is_expired(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
    now - self.acquired_at >= expiry
  }

  /// Whether a session may take (or refresh) the lock while `self` is held.
  pub fn yields_to(&self, session_key: &str, now: DateTime<Utc>, expiry: Duration) -> bool {
    self.session_key == session_key || self.is_expired(now, expiry)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleLanguage {
  pub language_id:   Uuid,
  pub video_id:      String,
  pub language_code: String,
  pub created_at:    DateTime<Utc>,
  pub writelock:     Option<WriteLock>,
  /// Denormalised; rewritten only by signoff recomputation.
  pub signoffs:      SignoffCounts,
}

/// Which branches of a video to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchFilter {
  #[default]
  All,
  /// At least one version.
  HavingVersions,
  /// At least one version whose effective visibility is public.
  HavingPublicVersions,
}

/// A branch together with what its tip says about it.
///
/// `title`, `description` and `subtitle_count` come from the tip and are
/// empty (or zero) while the branch has no versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSummary {
  #[serde(flatten)]
  pub language:       SubtitleLanguage,
  pub num_versions:   u32,
  pub subtitle_count: usize,
  pub title:          String,
  pub description:    String,
}
