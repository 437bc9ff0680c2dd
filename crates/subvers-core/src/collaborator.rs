//! Collaborators and the denormalised signoff counters on a branch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user working on a specific branch. One record per (user, branch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
  pub collaborator_id:     Uuid,
  pub user_id:             String,
  pub language_id:         Uuid,
  pub signoff:             bool,
  pub signoff_is_official: bool,
  pub expired:             bool,
  /// Start of the window after which a pending signoff expires; set once on
  /// creation.
  pub expiration_start:    DateTime<Utc>,
  pub created_at:          DateTime<Utc>,
}

/// The mutable part of a [`Collaborator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorState {
  #[serde(default)]
  pub signoff:             bool,
  #[serde(default)]
  pub signoff_is_official: bool,
  #[serde(default)]
  pub expired:             bool,
}

/// Counters stored on the branch for fast retrieval and filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignoffCounts {
  pub official:          u32,
  pub unofficial:        u32,
  pub pending:           u32,
  pub pending_expired:   u32,
  pub pending_unexpired: u32,
}

impl SignoffCounts {
  /// Full recount over a branch's current collaborators.
  pub fn tally<'a, I>(collaborators: I) -> Self
  where
    I: IntoIterator<Item = &'a Collaborator>,
  {
    let mut counts = Self::default();
    for c in collaborators {
      match (c.signoff, c.signoff_is_official, c.expired) {
        (true, true, _) => counts.official += 1,
        (true, false, _) => counts.unofficial += 1,
        (false, _, true) => {
          counts.pending += 1;
          counts.pending_expired += 1;
        }
        (false, _, false) => {
          counts.pending += 1;
          counts.pending_unexpired += 1;
        }
      }
    }
    counts
  }
}
