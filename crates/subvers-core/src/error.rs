//! Error types for `subvers-core`.

use serde::Serialize;
use thiserror::Error;

/// The broad class of a failure, used by callers to decide how to present or
/// recover from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// A domain rule was violated; the message names the rule.
  Validation,
  /// Input could not be interpreted as the requested type.
  Type,
  /// A uniqueness constraint rejected a concurrent write.
  UniqueConstraint,
  /// A recoverable condition persisted past the retry budget.
  Transient,
  /// The resource is held by someone else.
  Conflict,
  NotFound,
  Internal,
}

/// Implemented by every error type in the workspace.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("versions cannot have two parents from the same language ({0})")]
  DuplicateParentLanguage(String),

  #[error(
    "parent {language}{parent} precedes {language}{recorded} already in the \
     lineage"
  )]
  ParentPrecedesLineage {
    language: String,
    parent:   u32,
    recorded: u32,
  },

  #[error("{0} must be a string")]
  NotText(&'static str),

  #[error("unknown language code: {0:?}")]
  UnknownLanguage(String),

  #[error("unknown visibility: {0:?}")]
  UnknownVisibility(String),

  #[error("cannot build a subtitle document from {0}")]
  UnsupportedContent(String),

  #[error("video not found: {0}")]
  VideoNotFound(String),

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::DuplicateParentLanguage(_)
      | Self::ParentPrecedesLineage { .. }
      | Self::NotText(_)
      | Self::UnknownLanguage(_)
      | Self::UnknownVisibility(_) => ErrorKind::Validation,
      Self::UnsupportedContent(_) => ErrorKind::Type,
      Self::VideoNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
      Self::Serialization(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
