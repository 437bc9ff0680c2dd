//! The start-up configured catalog of languages, videos and users.
//!
//! Built once from configuration and threaded through the application state;
//! the store itself never consults it.

use std::collections::{BTreeSet, HashSet};

use crate::{Error, Result};

/// The author recorded when none is given.
pub const ANONYMOUS: &str = "anonymous";

/// Language codes accepted when no list is configured.
pub const DEFAULT_LANGUAGES: &[&str] = &[
  "ar", "cs", "da", "de", "el", "en", "en-gb", "es", "es-mx", "fa", "fi", "fr",
  "he", "hi", "hu", "id", "it", "ja", "ko", "nl", "no", "pl", "pt", "pt-br",
  "ro", "ru", "sv", "th", "tr", "uk", "vi", "zh-cn", "zh-tw",
];

#[derive(Debug, Clone)]
pub struct Catalog {
  languages: BTreeSet<String>,
  /// `None` accepts every video id.
  videos:    Option<HashSet<String>>,
  /// `None` accepts every author.
  users:     Option<HashSet<String>>,
}

impl Default for Catalog {
  fn default() -> Self {
    Self::new(DEFAULT_LANGUAGES.iter().map(|s| (*s).to_owned()))
  }
}

impl Catalog {
  pub fn new<I>(languages: I) -> Self
  where
    I: IntoIterator<Item = String>,
  {
    Self {
      languages: languages.into_iter().map(|l| l.to_ascii_lowercase()).collect(),
      videos:    None,
      users:     None,
    }
  }

  pub fn with_videos<I: IntoIterator<Item = String>>(mut self, videos: I) -> Self {
    self.videos = Some(videos.into_iter().collect());
    self
  }

  pub fn with_users<I: IntoIterator<Item = String>>(mut self, users: I) -> Self {
    self.users = Some(users.into_iter().collect());
    self
  }

  pub fn languages(&self) -> impl Iterator<Item = &str> {
    self.languages.iter().map(String::as_str)
  }

  /// Normalise `code` and check it is a known language.
  pub fn language(&self, code: &str) -> Result<String> {
    let code = code.trim().to_ascii_lowercase();
    if self.languages.contains(&code) {
      Ok(code)
    } else {
      Err(Error::UnknownLanguage(code))
    }
  }

  pub fn check_video(&self, video_id: &str) -> Result<()> {
    match &self.videos {
      Some(known) if !known.contains(video_id) => {
        Err(Error::VideoNotFound(video_id.to_owned()))
      }
      _ => Ok(()),
    }
  }

  /// The author to record: `user` if known, [`ANONYMOUS`] when absent.
  pub fn author(&self, user: Option<&str>) -> Result<String> {
    let Some(user) = user.filter(|u| !u.is_empty()) else {
      return Ok(ANONYMOUS.to_owned());
    };
    match &self.users {
      Some(known) if !known.contains(user) => Err(Error::UserNotFound(user.to_owned())),
      _ => Ok(user.to_owned()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn languages_are_normalised() {
    let catalog = Catalog::default();
    assert_eq!(catalog.language(" EN ").unwrap(), "en");
    assert!(matches!(catalog.language("xx"), Err(Error::UnknownLanguage(_))));
  }

  #[test]
  fn open_catalog_accepts_any_identity() {
    let catalog = Catalog::default();
    catalog.check_video("anything").unwrap();
    assert_eq!(catalog.author(Some("bob")).unwrap(), "bob");
  }

  #[test]
  fn closed_catalog_checks_membership() {
    let catalog = Catalog::default()
      .with_videos(["abc".to_owned()])
      .with_users(["alice".to_owned()]);
    catalog.check_video("abc").unwrap();
    assert!(matches!(catalog.check_video("zzz"), Err(Error::VideoNotFound(_))));
    assert_eq!(catalog.author(Some("alice")).unwrap(), "alice");
    assert!(matches!(catalog.author(Some("mallory")), Err(Error::UserNotFound(_))));
  }

  #[test]
  fn missing_author_is_anonymous() {
    let catalog = Catalog::default().with_users(Vec::<String>::new());
    assert_eq!(catalog.author(None).unwrap(), ANONYMOUS);
    assert_eq!(catalog.author(Some("")).unwrap(), ANONYMOUS);
  }
}
