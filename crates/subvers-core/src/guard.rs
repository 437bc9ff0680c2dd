//! Consistency rules checked before a version is admitted into the DAG.

use std::collections::HashSet;

use crate::{Error, Result, lineage::Lineage, version::SubtitleVersion};

/// Check the proposed `parents` of a version whose merged lineage is
/// `lineage`.
///
/// 1. At most one parent per language code.
/// 2. No parent may precede a version of its language already recorded in
///    the lineage. If English was based on French 2, a later English version
///    cannot be based on French 1.
pub fn check_parents(lineage: &Lineage, parents: &[SubtitleVersion]) -> Result<()> {
  let mut seen = HashSet::with_capacity(parents.len());
  for parent in parents {
    if !seen.insert(parent.language_code.as_str()) {
      return Err(Error::DuplicateParentLanguage(parent.language_code.clone()));
    }
  }

  for parent in parents {
    if let Some(recorded) = lineage.get(&parent.language_code)
      && parent.version_number < recorded
    {
      return Err(Error::ParentPrecedesLineage {
        language: parent.language_code.clone(),
        parent:   parent.version_number,
        recorded,
      });
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::version::test_helpers::version;

  #[test]
  fn distinct_languages_pass() {
    let parents = vec![
      version("en", 2, Lineage::new()),
      version("fr", 1, Lineage::new()),
    ];
    let lineage = Lineage::from_parents(&parents);
    check_parents(&lineage, &parents).unwrap();
  }

  #[test]
  fn two_parents_from_one_language_fail() {
    let parents = vec![
      version("en", 1, Lineage::new()),
      version("en", 2, Lineage::new()),
    ];
    let lineage = Lineage::from_parents(&parents);
    let err = check_parents(&lineage, &parents).unwrap_err();
    assert!(matches!(err, Error::DuplicateParentLanguage(ref l) if l == "en"));
  }

  #[test]
  fn parent_behind_lineage_fails() {
    let fr_lineage: Lineage = [("fr".to_owned(), 2)].into_iter().collect();
    let tip = version("en", 3, fr_lineage);
    let fr1 = version("fr", 1, Lineage::new());

    let parents = vec![fr1, tip];
    let lineage = Lineage::from_parents(&parents);
    let err = check_parents(&lineage, &parents).unwrap_err();
    assert!(matches!(
      err,
      Error::ParentPrecedesLineage { ref language, parent: 1, recorded: 2 } if language == "fr"
    ));
  }

  #[test]
  fn parent_at_or_after_lineage_passes() {
    for number in [2, 3] {
      let fr_lineage: Lineage = [("fr".to_owned(), 2)].into_iter().collect();
      let parents = vec![version("fr", number, Lineage::new()), version("en", 3, fr_lineage)];
      let lineage = Lineage::from_parents(&parents);
      check_parents(&lineage, &parents).unwrap();
    }
  }
}
