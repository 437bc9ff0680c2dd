//! Error type for `subvers-store-sqlite`.

use subvers_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] subvers_core::Error),

  #[error(transparent)]
  Codec(#[from] subvers_dfxp::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("subtitle language not found: {0}")]
  BranchNotFound(uuid::Uuid),

  #[error("subtitle version not found: {0}")]
  VersionNotFound(uuid::Uuid),

  #[error("subtitle language is write-locked by {owner}")]
  WriteLocked { owner: String },

  #[error("unique constraint violated: {0}")]
  UniqueConstraint(String),

  /// Every attempt lost the race for the next version number.
  #[error("gave up after {attempts} conflicting attempts; try again")]
  RetriesExhausted { attempts: u32 },
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      Self::Codec(e) => e.kind(),
      Self::Database(_) | Self::Uuid(_) | Self::DateParse(_) => ErrorKind::Internal,
      Self::BranchNotFound(_) | Self::VersionNotFound(_) => ErrorKind::NotFound,
      Self::WriteLocked { .. } => ErrorKind::Conflict,
      Self::UniqueConstraint(_) => ErrorKind::UniqueConstraint,
      Self::RetriesExhausted { .. } => ErrorKind::Transient,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
