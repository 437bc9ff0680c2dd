//! The reversible blob transform applied to canonical markup before storage:
//! zlib, then standard base64 so the result fits a text column.

use std::io::{Read as _, Write as _};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};

use crate::Result;

pub(crate) fn compress(text: &str) -> Result<String> {
  let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
  encoder.write_all(text.as_bytes())?;
  Ok(STANDARD.encode(encoder.finish()?))
}

pub(crate) fn decompress(blob: &str) -> Result<String> {
  let bytes = STANDARD.decode(blob.trim())?;
  let mut text = String::new();
  ZlibDecoder::new(bytes.as_slice()).read_to_string(&mut text)?;
  Ok(text)
}
