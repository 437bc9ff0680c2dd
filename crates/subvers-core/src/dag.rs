//! Planning a new commit on a branch.
//!
//! [`plan_version`] is the pure part of `add_version`: given the branch tip
//! and the caller's explicit parents it decides the effective parent set, the
//! next version number and the lineage, then runs the consistency guard. A
//! store persists the plan atomically, or rejects it when a concurrent writer
//! took the same number first.

use crate::{Result, guard, lineage::Lineage, version::SubtitleVersion};

/// The computed, validated shape of a version about to be written.
#[derive(Debug, Clone)]
pub struct VersionPlan {
  pub version_number: u32,
  pub lineage:        Lineage,
  /// Explicit parents followed by the tip, deduplicated.
  pub parents:        Vec<SubtitleVersion>,
}

pub fn plan_version(
  tip: Option<SubtitleVersion>,
  explicit_parents: Vec<SubtitleVersion>,
) -> Result<VersionPlan> {
  let version_number = tip.as_ref().map_or(1, |t| t.version_number + 1);

  let mut parents: Vec<SubtitleVersion> = Vec::with_capacity(explicit_parents.len() + 1);
  for parent in explicit_parents.into_iter().chain(tip) {
    if !parents.iter().any(|p| p.version_id == parent.version_id) {
      parents.push(parent);
    }
  }

  let lineage = Lineage::from_parents(&parents);
  guard::check_parents(&lineage, &parents)?;

  Ok(VersionPlan { version_number, lineage, parents })
}
