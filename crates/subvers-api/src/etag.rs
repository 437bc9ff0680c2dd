//! ETag computation for subtitle documents.
//!
//! The ETag is a SHA-256 over the stored blob, so two versions with identical
//! subtitles share a tag.

use sha2::{Digest, Sha256};

pub fn compute_etag(serialized_subtitles: &str) -> String {
  let hash = Sha256::digest(serialized_subtitles.as_bytes());
  format!("\"{}\"", hex::encode(hash))
}

/// Whether an `If-None-Match` header value matches `etag`.
pub fn matches(if_none_match: &str, etag: &str) -> bool {
  if_none_match
    .split(',')
    .map(str::trim)
    .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}
