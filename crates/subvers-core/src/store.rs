//! The `SubtitleStore` trait.
//!
//! Implemented by storage backends (e.g. `subvers-store-sqlite`). Higher
//! layers (`subvers-api`) depend on this abstraction, not on any concrete
//! backend.

use std::{collections::BTreeSet, future::Future};

use uuid::Uuid;

use crate::{
  Classify,
  collaborator::{Collaborator, CollaboratorState, SignoffCounts},
  history::VideoHistory,
  language::{BranchFilter, BranchSummary, SubtitleLanguage},
  version::{NewVersion, SubtitleVersion, Visibility},
};

/// Abstraction over a versioned subtitle store.
///
/// Versions are append-only: apart from [`SubtitleStore::set_visibility`], no
/// method modifies a version after [`SubtitleStore::add_version`] returns it.
/// The only mutable shared state per branch (write-lock and signoff counters)
/// is written exclusively through the methods below.
///
/// Lookups of a missing branch or version return `Ok(None)`; operations that
/// need one to exist fail with a not-found error.
pub trait SubtitleStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Branches ──────────────────────────────────────────────────────────

  /// Return the branch for (`video_id`, `language_code`), creating it if it
  /// does not exist. Safe to race: the loser of a concurrent creation gets
  /// the winner's branch.
  fn create_or_get_branch<'a>(
    &'a self,
    video_id: &'a str,
    language_code: &'a str,
  ) -> impl Future<Output = Result<SubtitleLanguage, Self::Error>> + Send + 'a;

  fn get_branch<'a>(
    &'a self,
    video_id: &'a str,
    language_code: &'a str,
  ) -> impl Future<Output = Result<Option<SubtitleLanguage>, Self::Error>> + Send + 'a;

  fn get_branch_by_id(
    &self,
    language_id: Uuid,
  ) -> impl Future<Output = Result<Option<SubtitleLanguage>, Self::Error>> + Send + '_;

  /// Branches of a video ordered by language code, narrowed by `filter`.
  fn list_branches<'a>(
    &'a self,
    video_id: &'a str,
    filter: BranchFilter,
  ) -> impl Future<Output = Result<Vec<SubtitleLanguage>, Self::Error>> + Send + 'a;

  /// The branch plus its version count and the tip's title, description and
  /// number of subtitle items.
  fn branch_summary(
    &self,
    language_id: Uuid,
  ) -> impl Future<Output = Result<BranchSummary, Self::Error>> + Send + '_;

  // ── Versions ──────────────────────────────────────────────────────────

  /// The highest-numbered version on the branch, if any.
  fn get_tip(
    &self,
    language_id: Uuid,
  ) -> impl Future<Output = Result<Option<SubtitleVersion>, Self::Error>> + Send + '_;

  /// Commit a new version on top of the branch tip.
  ///
  /// The tip is always an implicit parent. The version number, lineage and
  /// creation time are computed here; the version and its parent edges are
  /// written atomically or not at all. Write-locks are not checked.
  fn add_version(
    &self,
    language_id: Uuid,
    input: NewVersion,
  ) -> impl Future<Output = Result<SubtitleVersion, Self::Error>> + Send + '_;

  fn get_version(
    &self,
    version_id: Uuid,
  ) -> impl Future<Output = Result<Option<SubtitleVersion>, Self::Error>> + Send + '_;

  /// All versions of a branch in ascending number order.
  fn list_versions(
    &self,
    language_id: Uuid,
    public_only: bool,
  ) -> impl Future<Output = Result<Vec<SubtitleVersion>, Self::Error>> + Send + '_;

  fn num_versions(
    &self,
    language_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// Direct parents of a version.
  fn get_parents(
    &self,
    version_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SubtitleVersion>, Self::Error>> + Send + '_;

  /// Every transitive ancestor of a version, found by walking parent edges.
  ///
  /// Expensive: the walk does not remember visited versions, so its cost
  /// grows with branchiness ^ depth. Meant for debugging and tests; use the
  /// lineage for real ancestry checks.
  fn get_ancestors_debug(
    &self,
    version_id: Uuid,
  ) -> impl Future<Output = Result<BTreeSet<Uuid>, Self::Error>> + Send + '_;

  /// Change the only mutable fields of a version.
  fn set_visibility(
    &self,
    version_id: Uuid,
    visibility: Visibility,
    visibility_override: Option<Visibility>,
  ) -> impl Future<Output = Result<SubtitleVersion, Self::Error>> + Send + '_;

  fn video_history<'a>(
    &'a self,
    video_id: &'a str,
  ) -> impl Future<Output = Result<VideoHistory, Self::Error>> + Send + 'a;

  // ── Write-locks ───────────────────────────────────────────────────────

  /// Take the branch write-lock for `session_key`. Fails with a conflict if
  /// another live session holds it.
  fn acquire_writelock<'a>(
    &'a self,
    language_id: Uuid,
    owner: &'a str,
    session_key: &'a str,
  ) -> impl Future<Output = Result<SubtitleLanguage, Self::Error>> + Send + 'a;

  /// Release the lock held by `session_key`. Releasing an unlocked branch is
  /// a no-op.
  fn release_writelock<'a>(
    &'a self,
    language_id: Uuid,
    session_key: &'a str,
  ) -> impl Future<Output = Result<SubtitleLanguage, Self::Error>> + Send + 'a;

  // ── Collaborators ─────────────────────────────────────────────────────

  /// Create or update the collaborator record for (`user_id`, branch), then
  /// recompute the branch's signoff counters.
  fn save_collaborator<'a>(
    &'a self,
    language_id: Uuid,
    user_id: &'a str,
    state: CollaboratorState,
  ) -> impl Future<Output = Result<Collaborator, Self::Error>> + Send + 'a;

  fn list_collaborators(
    &self,
    language_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Collaborator>, Self::Error>> + Send + '_;

  /// Recount and persist the branch's signoff counters from its current
  /// collaborators.
  fn recompute_signoffs(
    &self,
    language_id: Uuid,
  ) -> impl Future<Output = Result<SignoffCounts, Self::Error>> + Send + '_;
}
