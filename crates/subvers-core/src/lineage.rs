//! Lineage: the flattened ancestry index carried by every version.
//!
//! A lineage maps each language code to the highest version number of that
//! language reachable from a version through any path of parent edges. It
//! answers "is en3 an ancestor of this version?" in O(1) without walking the
//! DAG, and it is persisted alongside the version as a JSON object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Result, version::SubtitleVersion};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lineage(BTreeMap<String, u32>);

impl Lineage {
  pub fn new() -> Self { Self::default() }

  /// Merge the ancestry of `parents`.
  ///
  /// Every parent contributes its own `(language_code, version_number)` plus
  /// every entry of its lineage; conflicts keep the larger number, so the
  /// result does not depend on the order of `parents`.
  pub fn from_parents<'a, I>(parents: I) -> Self
  where
    I: IntoIterator<Item = &'a SubtitleVersion>,
  {
    let mut lineage = Self::new();
    for parent in parents {
      lineage.record(&parent.language_code, parent.version_number);
      for (code, number) in parent.lineage.iter() {
        lineage.record(code, number);
      }
    }
    lineage
  }

  /// Record `number` for `code`, keeping whichever is later.
  pub fn record(&mut self, code: &str, number: u32) {
    match self.0.get_mut(code) {
      Some(existing) if *existing >= number => {}
      Some(existing) => *existing = number,
      None => {
        self.0.insert(code.to_owned(), number);
      }
    }
  }

  pub fn get(&self, code: &str) -> Option<u32> { self.0.get(code).copied() }

  /// Whether `code`/`number` (or a later version of `code`) is an ancestor.
  pub fn includes(&self, code: &str, number: u32) -> bool {
    self.get(code).is_some_and(|recorded| recorded >= number)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
    self.0.iter().map(|(code, number)| (code.as_str(), *number))
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  /// Parse the persisted form. A blank column is an empty lineage.
  pub fn from_json(s: &str) -> Result<Self> {
    if s.trim().is_empty() {
      return Ok(Self::new());
    }
    Ok(serde_json::from_str(s)?)
  }
}

impl FromIterator<(String, u32)> for Lineage {
  fn from_iter<T: IntoIterator<Item = (String, u32)>>(iter: T) -> Self {
    let mut lineage = Self::new();
    for (code, number) in iter {
      lineage.record(&code, number);
    }
    lineage
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::version::test_helpers::version;

  fn lineage(entries: &[(&str, u32)]) -> Lineage {
    entries.iter().map(|(c, n)| ((*c).to_owned(), *n)).collect()
  }

  #[test]
  fn no_parents_is_empty() {
    let merged = Lineage::from_parents(std::iter::empty());
    assert!(merged.is_empty());
  }

  #[test]
  fn parent_contributes_itself() {
    let v1 = version("en", 1, Lineage::new());
    let merged = Lineage::from_parents([&v1]);
    assert_eq!(merged, lineage(&[("en", 1)]));
  }

  #[test]
  fn conflicts_keep_the_later_version() {
    let en3 = version("en", 3, lineage(&[("fr", 2)]));
    let fr4 = version("fr", 4, lineage(&[("en", 1), ("de", 7)]));
    let merged = Lineage::from_parents([&en3, &fr4]);
    assert_eq!(merged, lineage(&[("en", 3), ("fr", 4), ("de", 7)]));
  }

  #[test]
  fn parent_order_does_not_matter() {
    let en3 = version("en", 3, lineage(&[("fr", 2), ("de", 1)]));
    let fr1 = version("fr", 1, Lineage::new());
    let de5 = version("de", 5, lineage(&[("en", 2)]));

    let a = Lineage::from_parents([&en3, &fr1, &de5]);
    let b = Lineage::from_parents([&de5, &en3, &fr1]);
    let c = Lineage::from_parents([&fr1, &de5, &en3]);
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.get("fr"), Some(2));
  }

  #[test]
  fn includes_checks_precedence() {
    let l = lineage(&[("fr", 2)]);
    assert!(l.includes("fr", 1));
    assert!(l.includes("fr", 2));
    assert!(!l.includes("fr", 3));
    assert!(!l.includes("de", 1));
  }

  #[test]
  fn json_is_a_plain_object() {
    let l = lineage(&[("en", 1), ("fr", 2)]);
    let json = l.to_json().unwrap();
    assert_eq!(json, r#"{"en":1,"fr":2}"#);
    assert_eq!(Lineage::from_json(&json).unwrap(), l);
    assert!(Lineage::from_json("").unwrap().is_empty());
  }
}
