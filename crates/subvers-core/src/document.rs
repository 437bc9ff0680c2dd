//! Structured subtitle documents and the inputs they can be built from.
//!
//! A [`SubtitleDocument`] is an ordered sequence of timed text items. The
//! canonical markup codec lives in `subvers-dfxp`; this module only defines
//! the shapes and the dynamic-input classification done at the API boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

// ─── SubtitleItem ────────────────────────────────────────────────────────────

/// One cue. Times are milliseconds from the start of the video; either may be
/// absent while a cue is still unsynced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleItem {
  pub start_ms:      Option<u64>,
  pub end_ms:        Option<u64>,
  /// Line breaks are kept as `\n`. Documents rewrite `\r\n` and `\r` to
  /// `\n` when items are pushed.
  pub text:          String,
  /// Starts a new paragraph. Never set on the first item of a document.
  #[serde(default)]
  pub new_paragraph: bool,
}

impl SubtitleItem {
  pub fn new(start_ms: Option<u64>, end_ms: Option<u64>, text: impl Into<String>) -> Self {
    Self { start_ms, end_ms, text: text.into(), new_paragraph: false }
  }

  pub fn starting_paragraph(mut self) -> Self {
    self.new_paragraph = true;
    self
  }

  pub fn is_synced(&self) -> bool { self.start_ms.is_some() && self.end_ms.is_some() }
}

// ─── SubtitleDocument ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DocumentParts")]
pub struct SubtitleDocument {
  language_code: String,
  items:         Vec<SubtitleItem>,
}

#[derive(Deserialize)]
struct DocumentParts {
  language_code: String,
  #[serde(default)]
  items:         Vec<SubtitleItem>,
}

impl From<DocumentParts> for SubtitleDocument {
  fn from(parts: DocumentParts) -> Self {
    Self::from_items(parts.language_code, parts.items)
  }
}

impl SubtitleDocument {
  pub fn new(language_code: impl Into<String>) -> Self {
    Self { language_code: language_code.into(), items: Vec::new() }
  }

  pub fn from_items<I>(language_code: impl Into<String>, items: I) -> Self
  where
    I: IntoIterator<Item = SubtitleItem>,
  {
    let mut doc = Self::new(language_code);
    for item in items {
      doc.push(item);
    }
    doc
  }

  /// Append an item. The first item of a document always opens the first
  /// paragraph, so its `new_paragraph` flag is cleared. Carriage returns in
  /// the text become plain `\n` line breaks.
  pub fn push(&mut self, mut item: SubtitleItem) {
    if self.items.is_empty() {
      item.new_paragraph = false;
    }
    if item.text.contains('\r') {
      item.text = item.text.replace("\r\n", "\n").replace('\r', "\n");
    }
    self.items.push(item);
  }

  pub fn language_code(&self) -> &str { &self.language_code }

  pub fn items(&self) -> &[SubtitleItem] { &self.items }

  pub fn len(&self) -> usize { self.items.len() }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Relabel the document, e.g. when content is committed to a branch.
  pub fn with_language_code(mut self, language_code: impl Into<String>) -> Self {
    self.language_code = language_code.into();
    self
  }
}

// ─── SubtitleContent ─────────────────────────────────────────────────────────

/// The forms a caller may hand in when committing subtitles.
#[derive(Debug, Clone, PartialEq)]
pub enum SubtitleContent {
  /// No subtitles; becomes an empty document.
  Empty,
  /// Canonical markup, parsed as-is.
  Markup(String),
  /// Already structured; used unchanged.
  Document(SubtitleDocument),
  /// Item tuples, converted one by one.
  Items(Vec<SubtitleItem>),
}

impl From<SubtitleDocument> for SubtitleContent {
  fn from(doc: SubtitleDocument) -> Self { Self::Document(doc) }
}

impl From<Vec<SubtitleItem>> for SubtitleContent {
  fn from(items: Vec<SubtitleItem>) -> Self { Self::Items(items) }
}

impl SubtitleContent {
  /// Classify untyped JSON input.
  ///
  /// - `null` → [`SubtitleContent::Empty`]
  /// - string → [`SubtitleContent::Markup`]
  /// - object → [`SubtitleContent::Document`]
  /// - array of `[start, end, text]` or `[start, end, text, {meta}]` →
  ///   [`SubtitleContent::Items`]
  ///
  /// Anything else is rejected with [`Error::UnsupportedContent`] naming the
  /// offending type.
  pub fn from_json(value: Value) -> Result<Self> {
    match value {
      Value::Null => Ok(Self::Empty),
      Value::String(markup) => Ok(Self::Markup(markup)),
      object @ Value::Object(_) => serde_json::from_value(object)
        .map(Self::Document)
        .map_err(|e| Error::UnsupportedContent(format!("document object: {e}"))),
      Value::Array(entries) => entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| item_from_tuple(i, entry))
        .collect::<Result<Vec<_>>>()
        .map(Self::Items),
      other => Err(Error::UnsupportedContent(json_type_name(&other).to_owned())),
    }
  }
}

fn item_from_tuple(index: usize, entry: Value) -> Result<SubtitleItem> {
  let unsupported = |what: &str| {
    Error::UnsupportedContent(format!("item {index}: {what}"))
  };

  let fields = match entry {
    Value::Array(fields) => fields,
    other => return Err(unsupported(json_type_name(&other))),
  };
  if !(3..=4).contains(&fields.len()) {
    return Err(unsupported(&format!("tuple of {} fields", fields.len())));
  }

  let time = |v: &Value| match v {
    Value::Null => Ok(None),
    Value::Number(n) => n
      .as_u64()
      .map(Some)
      .ok_or_else(|| unsupported("negative or fractional time")),
    other => Err(unsupported(json_type_name(other))),
  };

  let start_ms = time(&fields[0])?;
  let end_ms = time(&fields[1])?;
  let Value::String(text) = &fields[2] else {
    return Err(unsupported(json_type_name(&fields[2])));
  };

  let new_paragraph = match fields.get(3) {
    None | Some(Value::Null) => false,
    Some(Value::Object(meta)) => meta
      .get("new_paragraph")
      .and_then(Value::as_bool)
      .unwrap_or(false),
    Some(other) => return Err(unsupported(json_type_name(other))),
  };

  Ok(SubtitleItem { start_ms, end_ms, text: text.clone(), new_paragraph })
}

/// Accept an optional free-text field from untyped input. Anything other
/// than a string (or absence) is a validation error naming `field`.
pub fn text_field(field: &'static str, value: Option<Value>) -> Result<Option<String>> {
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s)),
    Some(_) => Err(Error::NotText(field)),
  }
}

fn json_type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
    Value::Number(_) => "float",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn first_item_never_starts_a_paragraph() {
    let doc = SubtitleDocument::from_items("en", [
      SubtitleItem::new(Some(0), Some(1000), "a").starting_paragraph(),
      SubtitleItem::new(Some(1000), Some(2000), "b").starting_paragraph(),
    ]);
    assert!(!doc.items()[0].new_paragraph);
    assert!(doc.items()[1].new_paragraph);
  }

  #[test]
  fn carriage_returns_become_line_breaks() {
    let doc = SubtitleDocument::from_items("en", [
      SubtitleItem::new(Some(0), Some(1000), "a\rb"),
      SubtitleItem::new(Some(1000), Some(2000), "c\r\nd\n"),
    ]);
    assert_eq!(doc.items()[0].text, "a\nb");
    assert_eq!(doc.items()[1].text, "c\nd\n");
  }

  #[test]
  fn null_and_strings() {
    assert_eq!(SubtitleContent::from_json(Value::Null).unwrap(), SubtitleContent::Empty);
    assert_eq!(
      SubtitleContent::from_json(json!("<tt/>")).unwrap(),
      SubtitleContent::Markup("<tt/>".into())
    );
  }

  #[test]
  fn tuples_become_items() {
    let content = SubtitleContent::from_json(json!([
      [0, 1500, "Hello"],
      [null, null, "unsynced"],
      [2000, 3000, "Next", {"new_paragraph": true}],
    ]))
    .unwrap();

    let SubtitleContent::Items(items) = content else {
      panic!("expected items");
    };
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], SubtitleItem::new(Some(0), Some(1500), "Hello"));
    assert!(!items[1].is_synced());
    assert!(items[2].new_paragraph);
  }

  #[test]
  fn document_objects_are_normalised() {
    let content = SubtitleContent::from_json(json!({
      "language_code": "fr",
      "items": [{"start_ms": 0, "end_ms": 10, "text": "Salut", "new_paragraph": true}],
    }))
    .unwrap();
    let SubtitleContent::Document(doc) = content else {
      panic!("expected document");
    };
    assert_eq!(doc.language_code(), "fr");
    assert!(!doc.items()[0].new_paragraph);
  }

  #[test]
  fn integers_are_rejected_by_type() {
    let err = SubtitleContent::from_json(json!(42)).unwrap_err();
    assert!(matches!(&err, Error::UnsupportedContent(t) if t == "integer"));
    assert_eq!(crate::Classify::kind(&err), crate::ErrorKind::Type);

    assert!(matches!(
      SubtitleContent::from_json(json!(true)),
      Err(Error::UnsupportedContent(_))
    ));
    assert!(matches!(
      SubtitleContent::from_json(json!([[0, 1, 2]])),
      Err(Error::UnsupportedContent(_))
    ));
    assert!(matches!(
      SubtitleContent::from_json(json!([5])),
      Err(Error::UnsupportedContent(_))
    ));
  }

  #[test]
  fn misshapen_document_objects_are_type_errors() {
    let err = SubtitleContent::from_json(json!({"items": "nope"})).unwrap_err();
    assert!(matches!(&err, Error::UnsupportedContent(m) if m.starts_with("document object: ")));
    assert_eq!(crate::Classify::kind(&err), crate::ErrorKind::Type);
  }

  #[test]
  fn text_fields_must_be_strings() {
    assert_eq!(text_field("title", None).unwrap(), None);
    assert_eq!(text_field("title", Some(json!("T"))).unwrap(), Some("T".into()));
    let err = text_field("description", Some(json!({"x": 1}))).unwrap_err();
    assert!(matches!(err, Error::NotText("description")));
    assert_eq!(crate::Classify::kind(&err), crate::ErrorKind::Validation);
  }
}
