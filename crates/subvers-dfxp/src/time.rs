//! TTML time expressions.
//!
//! Output is always clock time with milliseconds (`HH:MM:SS.mmm`). Input also
//! accepts the offset forms (`1.5s`, `1500ms`, `2m`, `1h`).

use crate::{Error, Result};

pub(crate) fn format_time(ms: u64) -> String {
  let hours = ms / 3_600_000;
  let minutes = (ms % 3_600_000) / 60_000;
  let seconds = (ms % 60_000) / 1_000;
  let millis = ms % 1_000;
  format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

pub(crate) fn parse_time(expr: &str) -> Result<u64> {
  let expr = expr.trim();
  let invalid = || Error::InvalidTime(expr.to_owned());

  if expr.contains(':') {
    let parts: Vec<&str> = expr.split(':').collect();
    let [h, m, s] = parts.as_slice() else {
      return Err(invalid());
    };
    let hours: u64 = h.parse().map_err(|_| invalid())?;
    let minutes: u64 = m.parse().map_err(|_| invalid())?;
    let (whole, frac) = s.split_once('.').unwrap_or((*s, ""));
    let seconds: u64 = whole.parse().map_err(|_| invalid())?;
    if minutes >= 60 || seconds >= 60 {
      return Err(invalid());
    }
    let millis = fraction_ms(frac).ok_or_else(invalid)?;
    return hours
      .checked_mul(3_600_000)
      .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
      .ok_or_else(invalid);
  }

  let (number, scale) = if let Some(n) = expr.strip_suffix("ms") {
    (n, 1.0)
  } else if let Some(n) = expr.strip_suffix('s') {
    (n, 1_000.0)
  } else if let Some(n) = expr.strip_suffix('m') {
    (n, 60_000.0)
  } else if let Some(n) = expr.strip_suffix('h') {
    (n, 3_600_000.0)
  } else {
    return Err(invalid());
  };
  let value: f64 = number.parse().map_err(|_| invalid())?;
  let ms = (value * scale).round();
  // u64::MAX as f64 rounds up to 2^64, which is itself out of range
  if !ms.is_finite() || ms < 0.0 || ms >= u64::MAX as f64 {
    return Err(invalid());
  }
  Ok(ms as u64)
}

/// Milliseconds from the digits after the decimal point: "5" → 500,
/// "25" → 250, "1234" → 123.
fn fraction_ms(frac: &str) -> Option<u64> {
  if frac.is_empty() {
    return Some(0);
  }
  if !frac.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let digits: String = frac.chars().chain("000".chars()).take(3).collect();
  digits.parse().ok()
}
