//! Encoding and decoding helpers between subvers domain types and the plain
//! text stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs are hyphenated lowercase strings
//! and lineages are compact JSON objects.

use chrono::{DateTime, Utc};
use subvers_core::{
  collaborator::{Collaborator, SignoffCounts},
  language::{SubtitleLanguage, WriteLock},
  lineage::Lineage,
  version::{SubtitleVersion, Visibility},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Parent ids as produced by `group_concat(parent_id)`.
pub fn decode_uuid_list(s: Option<&str>) -> Result<Vec<Uuid>> {
  s.map(|s| s.split(',').filter(|id| !id.is_empty()).map(decode_uuid).collect())
    .unwrap_or_else(|| Ok(Vec::new()))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Visibility ──────────────────────────────────────────────────────────────

pub fn encode_visibility(v: Visibility) -> &'static str { v.as_str() }

pub fn decode_visibility(s: &str) -> Result<Visibility> { Ok(Visibility::parse(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `subtitle_versions` row plus its aggregated
/// parent edges.
pub struct RawVersion {
  pub version_id:           String,
  pub language_id:          String,
  pub video_id:             String,
  pub language_code:        String,
  pub version_number:       u32,
  pub visibility:           String,
  pub visibility_override:  Option<String>,
  pub author:               String,
  pub title:                String,
  pub description:          String,
  pub note:                 String,
  pub created_at:           String,
  pub serialized_subtitles: String,
  pub serialized_lineage:   String,
  // version_parents aggregate
  pub parent_ids:           Option<String>,
}

impl RawVersion {
  pub fn into_version(self) -> Result<SubtitleVersion> {
    let visibility_override = self
      .visibility_override
      .as_deref()
      .map(decode_visibility)
      .transpose()?;

    Ok(SubtitleVersion::from_parts(
      decode_uuid(&self.version_id)?,
      decode_uuid(&self.language_id)?,
      self.video_id,
      self.language_code,
      self.version_number,
      decode_uuid_list(self.parent_ids.as_deref())?,
      Lineage::from_json(&self.serialized_lineage)?,
      decode_visibility(&self.visibility)?,
      visibility_override,
      self.author,
      self.title,
      self.description,
      self.note,
      decode_dt(&self.created_at)?,
      self.serialized_subtitles,
    ))
  }
}

/// Raw values read from a `subtitle_languages` row.
pub struct RawLanguage {
  pub language_id:           String,
  pub video_id:              String,
  pub language_code:         String,
  pub created_at:            String,
  pub writelock_owner:       Option<String>,
  pub writelock_session_key: Option<String>,
  pub writelock_time:        Option<String>,
  pub signoffs:              SignoffCounts,
}

impl RawLanguage {
  pub fn into_language(self) -> Result<SubtitleLanguage> {
    let writelock = match (self.writelock_owner, self.writelock_session_key, self.writelock_time) {
      (Some(owner), Some(session_key), Some(at)) => Some(WriteLock {
        owner,
        session_key,
        acquired_at: decode_dt(&at)?,
      }),
      _ => None,
    };

    Ok(SubtitleLanguage {
      language_id: decode_uuid(&self.language_id)?,
      video_id: self.video_id,
      language_code: self.language_code,
      created_at: decode_dt(&self.created_at)?,
      writelock,
      signoffs: self.signoffs,
    })
  }
}

/// Raw values read from a `collaborators` row.
pub struct RawCollaborator {
  pub collaborator_id:     String,
  pub user_id:             String,
  pub language_id:         String,
  pub signoff:             bool,
  pub signoff_is_official: bool,
  pub expired:             bool,
  pub expiration_start:    String,
  pub created_at:          String,
}

impl RawCollaborator {
  pub fn into_collaborator(self) -> Result<Collaborator> {
    Ok(Collaborator {
      collaborator_id:     decode_uuid(&self.collaborator_id)?,
      user_id:             self.user_id,
      language_id:         decode_uuid(&self.language_id)?,
      signoff:             self.signoff,
      signoff_is_official: self.signoff_is_official,
      expired:             self.expired,
      expiration_start:    decode_dt(&self.expiration_start)?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parent_list_tolerates_no_edges() {
    assert!(decode_uuid_list(None).unwrap().is_empty());
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let joined = format!("{},{}", encode_uuid(a), encode_uuid(b));
    assert_eq!(decode_uuid_list(Some(&joined)).unwrap(), vec![a, b]);
  }

  #[test]
  fn bad_timestamp_is_reported() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
