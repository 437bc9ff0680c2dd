//! Error types for the subvers-dfxp codec.

use subvers_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed timed-text markup: {0}")]
  Markup(String),

  #[error("invalid time expression: {0:?}")]
  InvalidTime(String),

  #[error("markup has no <tt> root element")]
  MissingRoot,

  #[error("stored subtitles are not valid base64: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("stored subtitles could not be (de)compressed: {0}")]
  Compression(#[from] std::io::Error),

  #[error(transparent)]
  Core(#[from] subvers_core::Error),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Markup(_) | Self::InvalidTime(_) | Self::MissingRoot => ErrorKind::Type,
      Self::Base64(_) | Self::Compression(_) => ErrorKind::Internal,
      Self::Core(e) => e.kind(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
