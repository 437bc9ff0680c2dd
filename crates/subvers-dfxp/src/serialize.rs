//! Canonical DFXP writer.
//!
//! One `<div>` per paragraph, one `<p>` per item, `<br/>` for line breaks.
//! Unsynced items simply omit `begin`/`end`. No indentation is emitted, so
//! the output parses back to exactly the same items.

use std::io::Cursor;

use quick_xml::{
  Writer,
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use subvers_core::document::SubtitleDocument;

use crate::{
  Error, Result,
  time::format_time,
};

pub const NS_TTML: &str = "http://www.w3.org/ns/ttml";
pub const NS_TTML_STYLING: &str = "http://www.w3.org/ns/ttml#styling";

pub(crate) fn to_markup(doc: &SubtitleDocument) -> Result<String> {
  let mut w = Writer::new(Cursor::new(Vec::new()));

  emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

  let mut tt = BytesStart::new("tt");
  tt.push_attribute(("xmlns", NS_TTML));
  tt.push_attribute(("xmlns:tts", NS_TTML_STYLING));
  tt.push_attribute(("xml:lang", doc.language_code()));
  emit(&mut w, Event::Start(tt))?;
  emit(&mut w, Event::Empty(BytesStart::new("head")))?;
  emit(&mut w, Event::Start(BytesStart::new("body")))?;

  let mut div_open = false;
  for item in doc.items() {
    if !div_open || item.new_paragraph {
      if div_open {
        emit(&mut w, Event::End(BytesEnd::new("div")))?;
      }
      emit(&mut w, Event::Start(BytesStart::new("div")))?;
      div_open = true;
    }

    let mut p = BytesStart::new("p");
    if let Some(start) = item.start_ms {
      p.push_attribute(("begin", format_time(start).as_str()));
    }
    if let Some(end) = item.end_ms {
      p.push_attribute(("end", format_time(end).as_str()));
    }
    emit(&mut w, Event::Start(p))?;
    for (i, line) in item.text.split('\n').enumerate() {
      if i > 0 {
        emit(&mut w, Event::Empty(BytesStart::new("br")))?;
      }
      if !line.is_empty() {
        emit(&mut w, Event::Text(BytesText::new(line)))?;
      }
    }
    emit(&mut w, Event::End(BytesEnd::new("p")))?;
  }

  if div_open {
    emit(&mut w, Event::End(BytesEnd::new("div")))?;
  }
  emit(&mut w, Event::End(BytesEnd::new("body")))?;
  emit(&mut w, Event::End(BytesEnd::new("tt")))?;

  String::from_utf8(w.into_inner().into_inner())
    .map_err(|e| Error::Markup(e.to_string()))
}

fn emit(w: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<()> {
  w.write_event(event).map_err(|e| Error::Markup(e.to_string()))
}

#[cfg(test)]
mod tests {
  use subvers_core::document::SubtitleItem;

  use super::*;

  #[test]
  fn writes_paragraphs_and_breaks() {
    let doc = SubtitleDocument::from_items("en", [
      SubtitleItem::new(Some(0), Some(1500), "Hello\nworld"),
      SubtitleItem::new(Some(1500), Some(3000), "a < b & c"),
      SubtitleItem::new(None, None, "later").starting_paragraph(),
    ]);
    let xml = to_markup(&doc).unwrap();

    assert!(xml.contains(r#"xml:lang="en""#), "{xml}");
    assert!(xml.contains(r#"<p begin="00:00:00.000" end="00:00:01.500">Hello<br/>world</p>"#), "{xml}");
    assert!(xml.contains("a &lt; b &amp; c"), "{xml}");
    assert!(xml.contains("</div><div><p>later</p></div>"), "{xml}");
  }

  #[test]
  fn empty_document_has_an_empty_body() {
    let xml = to_markup(&SubtitleDocument::new("fr")).unwrap();
    assert!(xml.ends_with("<head/><body></body></tt>"), "{xml}");
  }
}
