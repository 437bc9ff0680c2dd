//! Subtitle codec for subvers.
//!
//! Converts between [`SubtitleDocument`]s and the blob stored on each
//! version: canonical DFXP (TTML) markup, zlib-compressed and base64-encoded.
//! Pure synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use subvers_core::document::{SubtitleDocument, SubtitleItem};
//!
//! let doc = SubtitleDocument::from_items("en", [SubtitleItem::new(Some(0), Some(1500), "Hello")]);
//! let blob = subvers_dfxp::encode(&doc).unwrap();
//! assert_eq!(subvers_dfxp::decode(&blob, "en").unwrap(), doc);
//! ```

pub mod error;
mod compress;
mod parse;
mod serialize;
mod time;

pub use error::{Error, Result};
pub use serialize::{NS_TTML, NS_TTML_STYLING};
use subvers_core::{
  document::{SubtitleContent, SubtitleDocument},
  version::SubtitleVersion,
};

// ─── Markup ──────────────────────────────────────────────────────────────────

/// Serialize `doc` as canonical DFXP markup.
pub fn to_markup(doc: &SubtitleDocument) -> Result<String> { serialize::to_markup(doc) }

/// Parse DFXP markup. `fallback_language` labels the document when the root
/// carries no `xml:lang`.
pub fn from_markup(markup: &str, fallback_language: &str) -> Result<SubtitleDocument> {
  parse::from_markup(markup, fallback_language)
}

// ─── Stored blobs ────────────────────────────────────────────────────────────

/// Encode `doc` into the stored representation.
pub fn encode(doc: &SubtitleDocument) -> Result<String> {
  compress::compress(&to_markup(doc)?)
}

/// Decode a stored blob. A blank blob is an empty document.
pub fn decode(blob: &str, language_code: &str) -> Result<SubtitleDocument> {
  if blob.trim().is_empty() {
    return Ok(SubtitleDocument::new(language_code));
  }
  from_markup(&compress::decompress(blob)?, language_code)
}

// ─── Content resolution ──────────────────────────────────────────────────────

/// Build the document a version on `language_code` will store.
///
/// The branch language always labels the result; items are taken unchanged.
pub fn resolve(content: SubtitleContent, language_code: &str) -> Result<SubtitleDocument> {
  Ok(match content {
    SubtitleContent::Empty => SubtitleDocument::new(language_code),
    SubtitleContent::Markup(markup) => {
      from_markup(&markup, language_code)?.with_language_code(language_code)
    }
    SubtitleContent::Document(doc) => doc.with_language_code(language_code),
    SubtitleContent::Items(items) => SubtitleDocument::from_items(language_code, items),
  })
}

// ─── Version helpers ─────────────────────────────────────────────────────────

/// The decoded subtitles of `version`, cached on the version after the first
/// call.
pub fn subtitles(version: &SubtitleVersion) -> Result<&SubtitleDocument> {
  version.subtitles_with(|blob| decode(blob, &version.language_code))
}

/// Replace the subtitles of an unsaved `version`, refreshing its cache.
pub fn set_subtitles(version: &mut SubtitleVersion, content: SubtitleContent) -> Result<()> {
  let doc = resolve(content, &version.language_code)?;
  let blob = encode(&doc)?;
  version.set_subtitles(blob, doc);
  Ok(())
}

pub fn subtitle_count(version: &SubtitleVersion) -> Result<usize> {
  Ok(subtitles(version)?.len())
}

// ─── Round-trip tests ────────────────────────────────────────────────────────
