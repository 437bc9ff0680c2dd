//! DFXP/TTML reader.
//!
//! Accepts the canonical form written by [`crate::serialize`] and the common
//! hand-written variations: namespace prefixes, inline `<span>` markup (text
//! kept, styling dropped), `dur` instead of `end`, and pretty-printed
//! documents whose raw line breaks are layout, not content.

use quick_xml::{
  Reader,
  events::{BytesStart, Event},
};
use subvers_core::document::{SubtitleDocument, SubtitleItem};

use crate::{Error, Result, time::parse_time};

/// An open `<p>` being accumulated.
struct OpenItem {
  start_ms:      Option<u64>,
  end_ms:        Option<u64>,
  new_paragraph: bool,
  lines:         Vec<String>,
  line:          String,
}

impl OpenItem {
  fn from_tag(e: &BytesStart<'_>, new_paragraph: bool) -> Result<Self> {
    let start_ms = attr(e, b"begin")?.map(|t| parse_time(&t)).transpose()?;
    let end_ms = match attr(e, b"end")? {
      Some(t) => Some(parse_time(&t)?),
      None => match (start_ms, attr(e, b"dur")?) {
        (Some(start), Some(dur)) => Some(
          start
            .checked_add(parse_time(&dur)?)
            .ok_or_else(|| Error::InvalidTime(dur.clone()))?,
        ),
        _ => None,
      },
    };
    Ok(Self {
      start_ms,
      end_ms,
      new_paragraph,
      lines: Vec::new(),
      line: String::new(),
    })
  }

  fn line_break(&mut self) {
    let line = std::mem::take(&mut self.line);
    self.lines.push(collapse_layout_breaks(&line));
  }

  fn finish(mut self) -> SubtitleItem {
    self.line_break();
    SubtitleItem {
      start_ms:      self.start_ms,
      end_ms:        self.end_ms,
      text:          self.lines.join("\n"),
      new_paragraph: self.new_paragraph,
    }
  }
}

pub(crate) fn from_markup(markup: &str, fallback_language: &str) -> Result<SubtitleDocument> {
  let mut reader = Reader::from_str(markup);
  reader.config_mut().trim_text(false);

  let mut language: Option<String> = None;
  let mut seen_root = false;
  let mut paragraph_pending = false;
  let mut current: Option<OpenItem> = None;
  let mut items: Vec<SubtitleItem> = Vec::new();

  loop {
    match reader.read_event().map_err(markup_error)? {
      Event::Start(e) => match local_name(e.name().as_ref()) {
        b"tt" => {
          seen_root = true;
          language = attr(&e, b"lang")?;
        }
        b"div" => paragraph_pending = true,
        b"p" => {
          current = Some(OpenItem::from_tag(&e, paragraph_pending)?);
          paragraph_pending = false;
        }
        _ => {}
      },
      Event::Empty(e) => match local_name(e.name().as_ref()) {
        b"tt" => {
          seen_root = true;
          language = attr(&e, b"lang")?;
        }
        b"br" => {
          if let Some(item) = current.as_mut() {
            item.line_break();
          }
        }
        b"p" => {
          items.push(OpenItem::from_tag(&e, paragraph_pending)?.finish());
          paragraph_pending = false;
        }
        _ => {}
      },
      Event::Text(t) => {
        if let Some(item) = current.as_mut() {
          item.line.push_str(&t.unescape().map_err(markup_error)?);
        }
      }
      Event::CData(c) => {
        if let Some(item) = current.as_mut() {
          item.line.push_str(&String::from_utf8_lossy(&c));
        }
      }
      Event::End(e) => {
        if local_name(e.name().as_ref()) == b"p"
          && let Some(item) = current.take()
        {
          items.push(item.finish());
        }
      }
      Event::Eof => break,
      _ => {}
    }
  }

  if !seen_root {
    return Err(Error::MissingRoot);
  }

  let language = language
    .filter(|l| !l.is_empty())
    .unwrap_or_else(|| fallback_language.to_owned());
  Ok(SubtitleDocument::from_items(language, items))
}

fn markup_error(e: impl std::fmt::Display) -> Error { Error::Markup(e.to_string()) }

fn local_name(name: &[u8]) -> &[u8] {
  // strip "prefix:" if present
  if let Some(pos) = name.iter().rposition(|&b| b == b':') {
    &name[pos + 1..]
  } else {
    name
  }
}

/// The unescaped value of the first attribute whose local name is `name`.
fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
  for a in e.attributes() {
    let a = a.map_err(markup_error)?;
    if local_name(a.key.as_ref()) == name {
      return Ok(Some(a.unescape_value().map_err(markup_error)?.into_owned()));
    }
  }
  Ok(None)
}

/// Whitespace runs containing a raw line break are source layout: they become
/// a single space inside a line and vanish at its edges. Other whitespace is
/// kept verbatim.
fn collapse_layout_breaks(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  let mut rest = raw;
  let mut at_start = true;

  while !rest.is_empty() {
    let ws_len = rest.len() - rest.trim_start().len();
    if ws_len > 0 {
      let (ws, tail) = rest.split_at(ws_len);
      if !ws.contains(['\n', '\r']) {
        out.push_str(ws);
      } else if !at_start && !tail.is_empty() {
        out.push(' ');
      }
      rest = tail;
    } else {
      let word_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
      out.push_str(&rest[..word_len]);
      rest = &rest[word_len..];
    }
    at_start = false;
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_hand_written_markup() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<tt xmlns="http://www.w3.org/ns/ttml" xml:lang="fr">
  <body>
    <div>
      <p begin="00:00:01.000" end="00:00:02.000">
        Bonjour
        <br/>
        le <span tts:fontStyle="italic">monde</span>
      </p>
      <p begin="2s" dur="1.5s">Encore</p>
    </div>
    <div>
      <p>Pas encore synchronisé</p>
    </div>
  </body>
</tt>"#;

    let doc = from_markup(xml, "en").unwrap();
    assert_eq!(doc.language_code(), "fr");
    assert_eq!(doc.len(), 3);

    let items = doc.items();
    assert_eq!(items[0].text, "Bonjour\nle monde");
    assert_eq!(items[0].start_ms, Some(1_000));
    assert_eq!(items[1].end_ms, Some(3_500));
    assert!(!items[1].new_paragraph);
    assert!(items[2].new_paragraph);
    assert!(!items[2].is_synced());
  }

  #[test]
  fn missing_language_uses_fallback() {
    let doc = from_markup("<tt><body><div><p>x</p></div></body></tt>", "de").unwrap();
    assert_eq!(doc.language_code(), "de");
  }

  #[test]
  fn prefixed_root_is_accepted() {
    let xml = r#"<tt:tt xmlns:tt="http://www.w3.org/ns/ttml"><tt:body><tt:div><tt:p begin="0s" end="1s">x</tt:p></tt:div></tt:body></tt:tt>"#;
    let doc = from_markup(xml, "en").unwrap();
    assert_eq!(doc.items()[0].end_ms, Some(1_000));
  }

  #[test]
  fn non_ttml_is_rejected() {
    assert!(matches!(from_markup("<html/>", "en"), Err(Error::MissingRoot)));
    assert!(matches!(from_markup("plain text", "en"), Err(Error::MissingRoot)));
    assert!(matches!(
      from_markup(r#"<tt><body><div><p begin="soon">x</p></div></body></tt>"#, "en"),
      Err(Error::InvalidTime(_))
    ));
  }

  #[test]
  fn overflowing_timings_are_rejected() {
    let huge_clock =
      r#"<tt><body><div><p begin="9999999999999999:00:00.000" end="1s">x</p></div></body></tt>"#;
    assert!(matches!(from_markup(huge_clock, "en"), Err(Error::InvalidTime(_))));

    let huge_sum = r#"<tt><body><div><p begin="10000000000000000s" dur="10000000000000000s">x</p></div></body></tt>"#;
    assert!(matches!(from_markup(huge_sum, "en"), Err(Error::InvalidTime(_))));
  }

  #[test]
  fn inline_spaces_survive() {
    assert_eq!(collapse_layout_breaks("  two  spaces "), "  two  spaces ");
    assert_eq!(collapse_layout_breaks("\n  a\n  b\n"), "a b");
  }
}
