//! [`SqliteStore`], the SQLite implementation of [`SubtitleStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use subvers_core::{
  collaborator::{Collaborator, CollaboratorState, SignoffCounts},
  dag,
  history::VideoHistory,
  language::{BranchFilter, BranchSummary, SubtitleLanguage, WriteLock},
  store::SubtitleStore,
  version::{NewVersion, SubtitleVersion, Visibility},
};

use crate::{
  encode::{
    RawCollaborator, RawLanguage, RawVersion, decode_uuid, encode_dt, encode_uuid,
    encode_visibility,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Tunables for a [`SqliteStore`].
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
  /// How many times `add_version` re-plans after losing the race for a
  /// version number.
  pub max_write_attempts: u32,
  /// Age after which a branch write-lock no longer blocks other sessions.
  pub writelock_expiry:   chrono::Duration,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      max_write_attempts: 3,
      writelock_expiry:   chrono::Duration::seconds(60),
    }
  }
}

// ─── Row mapping ─────────────────────────────────────────────────────────────

const VERSION_SELECT: &str = "SELECT
     v.version_id, v.language_id, v.video_id, v.language_code, v.version_number,
     v.visibility, v.visibility_override, v.author, v.title, v.description,
     v.note, v.created_at, v.serialized_subtitles, v.serialized_lineage,
     (SELECT group_concat(p.parent_id) FROM version_parents p
       WHERE p.child_id = v.version_id) AS parent_ids
   FROM subtitle_versions v";

const LANGUAGE_SELECT: &str = "SELECT
     language_id, video_id, language_code, created_at,
     writelock_owner, writelock_session_key, writelock_time,
     official_signoff_count, unofficial_signoff_count, pending_signoff_count,
     pending_signoff_expired_count, pending_signoff_unexpired_count
   FROM subtitle_languages";

const COLLABORATOR_SELECT: &str = "SELECT
     collaborator_id, user_id, language_id, signoff, signoff_is_official,
     expired, expiration_start, created_at
   FROM collaborators";

fn version_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawVersion> {
  Ok(RawVersion {
    version_id:           row.get(0)?,
    language_id:          row.get(1)?,
    video_id:             row.get(2)?,
    language_code:        row.get(3)?,
    version_number:       row.get(4)?,
    visibility:           row.get(5)?,
    visibility_override:  row.get(6)?,
    author:               row.get(7)?,
    title:                row.get(8)?,
    description:          row.get(9)?,
    note:                 row.get(10)?,
    created_at:           row.get(11)?,
    serialized_subtitles: row.get(12)?,
    serialized_lineage:   row.get(13)?,
    parent_ids:           row.get(14)?,
  })
}

fn language_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawLanguage> {
  Ok(RawLanguage {
    language_id:           row.get(0)?,
    video_id:              row.get(1)?,
    language_code:         row.get(2)?,
    created_at:            row.get(3)?,
    writelock_owner:       row.get(4)?,
    writelock_session_key: row.get(5)?,
    writelock_time:        row.get(6)?,
    signoffs:              SignoffCounts {
      official:          row.get(7)?,
      unofficial:        row.get(8)?,
      pending:           row.get(9)?,
      pending_expired:   row.get(10)?,
      pending_unexpired: row.get(11)?,
    },
  })
}

fn collaborator_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCollaborator> {
  Ok(RawCollaborator {
    collaborator_id:     row.get(0)?,
    user_id:             row.get(1)?,
    language_id:         row.get(2)?,
    signoff:             row.get(3)?,
    signoff_is_official: row.get(4)?,
    expired:             row.get(5)?,
    expiration_start:    row.get(6)?,
    created_at:          row.get(7)?,
  })
}

/// Whether `e` is a UNIQUE or PRIMARY KEY violation, i.e. a lost race.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subtitle store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  options: StoreOptions,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with default options.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, StoreOptions::default()).await
  }

  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, options };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with(StoreOptions::default()).await
  }

  pub async fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, options };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_versions(
    &self,
    clause: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<SubtitleVersion>> {
    let raws: Vec<RawVersion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("{VERSION_SELECT} {clause}"))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), version_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVersion::into_version).collect()
  }

  async fn query_branches(
    &self,
    clause: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<SubtitleLanguage>> {
    let raws: Vec<RawLanguage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("{LANGUAGE_SELECT} {clause}"))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), language_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLanguage::into_language).collect()
  }

  async fn require_branch(&self, language_id: Uuid) -> Result<SubtitleLanguage> {
    self
      .get_branch_by_id(language_id)
      .await?
      .ok_or(Error::BranchNotFound(language_id))
  }

  async fn require_version(&self, version_id: Uuid) -> Result<SubtitleVersion> {
    self
      .get_version(version_id)
      .await?
      .ok_or(Error::VersionNotFound(version_id))
  }

  /// Insert a version and its parent edges in one transaction.
  ///
  /// Returns `false`, leaving nothing behind, when another writer already
  /// holds the version's number on this branch.
  pub(crate) async fn insert_version(&self, version: &SubtitleVersion) -> Result<bool> {
    let version_id_str  = encode_uuid(version.version_id);
    let language_id_str = encode_uuid(version.language_id);
    let video_id        = version.video_id.clone();
    let language_code   = version.language_code.clone();
    let number          = version.version_number;
    let visibility      = encode_visibility(version.visibility).to_owned();
    let override_str    = version.visibility_override.map(|v| encode_visibility(v).to_owned());
    let author          = version.author.clone();
    let title           = version.title.clone();
    let description     = version.description.clone();
    let note            = version.note.clone();
    let created_at_str  = encode_dt(version.created_at);
    let subtitles       = version.serialized_subtitles.clone();
    let lineage_str     = version.lineage.to_json()?;
    let parent_strs: Vec<String> =
      version.parent_ids.iter().copied().map(encode_uuid).collect();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let result = tx.execute(
          "INSERT INTO subtitle_versions (
             version_id, language_id, video_id, language_code, version_number,
             visibility, visibility_override, author, title, description, note,
             created_at, serialized_subtitles, serialized_lineage
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params![
            version_id_str,
            language_id_str,
            video_id,
            language_code,
            number,
            visibility,
            override_str,
            author,
            title,
            description,
            note,
            created_at_str,
            subtitles,
            lineage_str,
          ],
        );

        match result {
          Ok(_) => {}
          // Dropping `tx` rolls back.
          Err(e) if is_unique_violation(&e) => return Ok(false),
          Err(e) => return Err(e.into()),
        }

        for parent in &parent_strs {
          tx.execute(
            "INSERT INTO version_parents (child_id, parent_id) VALUES (?1, ?2)",
            rusqlite::params![version_id_str, parent],
          )?;
        }

        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(inserted)
  }

  /// Clear the branch write-lock if `holder_key` still holds it. Returns
  /// `false` when the lock has changed hands (or is already gone).
  pub(crate) async fn clear_writelock(&self, language_id: Uuid, holder_key: &str) -> Result<bool> {
    let id_str = encode_uuid(language_id);
    let key    = holder_key.to_owned();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subtitle_languages
           SET writelock_owner = NULL, writelock_session_key = NULL, writelock_time = NULL
           WHERE language_id = ?1 AND writelock_session_key = ?2",
          rusqlite::params![id_str, key],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}

// ─── SubtitleStore impl ──────────────────────────────────────────────────────

impl SubtitleStore for SqliteStore {
  type Error = Error;

  // ── Branches ──────────────────────────────────────────────────────────────

  async fn create_or_get_branch<'a>(
    &'a self,
    video_id: &'a str,
    language_code: &'a str,
  ) -> Result<SubtitleLanguage> {
    if let Some(branch) = self.get_branch(video_id, language_code).await? {
      return Ok(branch);
    }

    let branch = SubtitleLanguage {
      language_id:   Uuid::new_v4(),
      video_id:      video_id.to_owned(),
      language_code: language_code.to_owned(),
      created_at:    Utc::now(),
      writelock:     None,
      signoffs:      SignoffCounts::default(),
    };

    let id_str   = encode_uuid(branch.language_id);
    let video    = branch.video_id.clone();
    let code     = branch.language_code.clone();
    let at_str   = encode_dt(branch.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO subtitle_languages (language_id, video_id, language_code, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, video, code, at_str],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if inserted {
      info!(%video_id, %language_code, language_id = %branch.language_id, "created subtitle language");
      return Ok(branch);
    }

    debug!(%video_id, %language_code, "lost branch creation race; using the winner");
    self
      .get_branch(video_id, language_code)
      .await?
      .ok_or_else(|| Error::UniqueConstraint(format!("{video_id}/{language_code}")))
  }

  async fn get_branch<'a>(
    &'a self,
    video_id: &'a str,
    language_code: &'a str,
  ) -> Result<Option<SubtitleLanguage>> {
    let mut found = self
      .query_branches(
        "WHERE video_id = ?1 AND language_code = ?2",
        vec![video_id.to_owned(), language_code.to_owned()],
      )
      .await?;
    Ok(found.pop())
  }

  async fn get_branch_by_id(&self, language_id: Uuid) -> Result<Option<SubtitleLanguage>> {
    let mut found = self
      .query_branches("WHERE language_id = ?1", vec![encode_uuid(language_id)])
      .await?;
    Ok(found.pop())
  }

  async fn list_branches<'a>(
    &'a self,
    video_id: &'a str,
    filter: BranchFilter,
  ) -> Result<Vec<SubtitleLanguage>> {
    let clause = match filter {
      BranchFilter::All => "WHERE video_id = ?1 ORDER BY language_code",
      BranchFilter::HavingVersions => {
        "WHERE video_id = ?1
           AND EXISTS (SELECT 1 FROM subtitle_versions v
                        WHERE v.language_id = subtitle_languages.language_id)
         ORDER BY language_code"
      }
      BranchFilter::HavingPublicVersions => {
        "WHERE video_id = ?1
           AND EXISTS (SELECT 1 FROM subtitle_versions v
                        WHERE v.language_id = subtitle_languages.language_id
                          AND COALESCE(v.visibility_override, v.visibility) = 'public')
         ORDER BY language_code"
      }
    };
    self.query_branches(clause, vec![video_id.to_owned()]).await
  }

  async fn branch_summary(&self, language_id: Uuid) -> Result<BranchSummary> {
    let language = self.require_branch(language_id).await?;
    let num_versions = self.num_versions(language_id).await?;

    let (subtitle_count, title, description) = match self.get_tip(language_id).await? {
      Some(tip) => (subvers_dfxp::subtitle_count(&tip)?, tip.title, tip.description),
      None => (0, String::new(), String::new()),
    };

    Ok(BranchSummary { language, num_versions, subtitle_count, title, description })
  }

  // ── Versions ──────────────────────────────────────────────────────────────

  async fn get_tip(&self, language_id: Uuid) -> Result<Option<SubtitleVersion>> {
    let mut found = self
      .query_versions(
        "WHERE v.language_id = ?1 ORDER BY v.version_number DESC LIMIT 1",
        vec![encode_uuid(language_id)],
      )
      .await?;
    Ok(found.pop())
  }

  async fn add_version(&self, language_id: Uuid, input: NewVersion) -> Result<SubtitleVersion> {
    let branch = self.require_branch(language_id).await?;

    let document = subvers_dfxp::resolve(input.subtitles, &branch.language_code)?;
    let serialized = subvers_dfxp::encode(&document)?;

    let mut explicit = Vec::with_capacity(input.parents.len());
    for parent_id in &input.parents {
      explicit.push(self.require_version(*parent_id).await?);
    }

    let attempts = self.options.max_write_attempts.max(1);
    for attempt in 1..=attempts {
      let tip = self.get_tip(language_id).await?;
      let plan = dag::plan_version(tip, explicit.clone())?;

      let mut version = SubtitleVersion::from_parts(
        Uuid::new_v4(),
        language_id,
        branch.video_id.clone(),
        branch.language_code.clone(),
        plan.version_number,
        plan.parents.iter().map(|p| p.version_id).collect(),
        plan.lineage,
        input.visibility,
        None,
        input.author.clone(),
        input.title.clone().unwrap_or_default(),
        input.description.clone().unwrap_or_default(),
        input.note.clone().unwrap_or_default(),
        Utc::now(),
        String::new(),
      );
      version.set_subtitles(serialized.clone(), document.clone());

      if self.insert_version(&version).await? {
        info!(
          %language_id,
          version_id = %version.version_id,
          version_number = version.version_number,
          parents = version.parent_ids.len(),
          "committed subtitle version"
        );
        return Ok(version);
      }

      warn!(
        %language_id,
        version_number = version.version_number,
        attempt,
        "version number taken by a concurrent writer; replanning"
      );
    }

    Err(Error::RetriesExhausted { attempts })
  }

  async fn get_version(&self, version_id: Uuid) -> Result<Option<SubtitleVersion>> {
    let mut found = self
      .query_versions("WHERE v.version_id = ?1", vec![encode_uuid(version_id)])
      .await?;
    Ok(found.pop())
  }

  async fn list_versions(
    &self,
    language_id: Uuid,
    public_only: bool,
  ) -> Result<Vec<SubtitleVersion>> {
    let versions = self
      .query_versions(
        "WHERE v.language_id = ?1 ORDER BY v.version_number",
        vec![encode_uuid(language_id)],
      )
      .await?;
    Ok(versions.into_iter().filter(|v| !public_only || v.is_public()).collect())
  }

  async fn num_versions(&self, language_id: Uuid) -> Result<u32> {
    let id_str = encode_uuid(language_id);
    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM subtitle_versions WHERE language_id = ?1",
          rusqlite::params![id_str],
          |r| r.get::<_, u32>(0),
        )?)
      })
      .await?;
    Ok(count)
  }

  async fn get_parents(&self, version_id: Uuid) -> Result<Vec<SubtitleVersion>> {
    self.require_version(version_id).await?;
    self
      .query_versions(
        "WHERE v.version_id IN (SELECT parent_id FROM version_parents WHERE child_id = ?1)
         ORDER BY v.language_code, v.version_number",
        vec![encode_uuid(version_id)],
      )
      .await
  }

  async fn get_ancestors_debug(&self, version_id: Uuid) -> Result<BTreeSet<Uuid>> {
    fn walk(
      conn: &rusqlite::Connection,
      id: &str,
      out: &mut Vec<String>,
    ) -> rusqlite::Result<()> {
      let parents: Vec<String> = {
        let mut stmt =
          conn.prepare_cached("SELECT parent_id FROM version_parents WHERE child_id = ?1")?;
        stmt
          .query_map([id], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?
      };
      for parent in parents {
        walk(conn, &parent, out)?;
        out.push(parent);
      }
      Ok(())
    }

    self.require_version(version_id).await?;

    let id_str = encode_uuid(version_id);
    let found: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut out = Vec::new();
        walk(conn, &id_str, &mut out)?;
        Ok(out)
      })
      .await?;

    debug!(%version_id, visited = found.len(), "walked ancestors");
    found.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn set_visibility(
    &self,
    version_id: Uuid,
    visibility: Visibility,
    visibility_override: Option<Visibility>,
  ) -> Result<SubtitleVersion> {
    let id_str       = encode_uuid(version_id);
    let vis_str      = encode_visibility(visibility).to_owned();
    let override_str = visibility_override.map(|v| encode_visibility(v).to_owned());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subtitle_versions SET visibility = ?2, visibility_override = ?3
           WHERE version_id = ?1",
          rusqlite::params![id_str, vis_str, override_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::VersionNotFound(version_id));
    }
    self.require_version(version_id).await
  }

  async fn video_history<'a>(&'a self, video_id: &'a str) -> Result<VideoHistory> {
    let versions = self
      .query_versions(
        "WHERE v.video_id = ?1 ORDER BY v.language_code, v.version_number",
        vec![video_id.to_owned()],
      )
      .await?;

    let video = video_id.to_owned();
    let raw_edges: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT p.parent_id, p.child_id
           FROM version_parents p
           JOIN subtitle_versions v ON v.version_id = p.child_id
           WHERE v.video_id = ?1
           ORDER BY v.language_code, v.version_number, p.parent_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![video], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let edges = raw_edges
      .iter()
      .map(|(parent, child)| Ok((decode_uuid(parent)?, decode_uuid(child)?)))
      .collect::<Result<Vec<_>>>()?;

    Ok(VideoHistory { video_id: video_id.to_owned(), versions, edges })
  }

  // ── Write-locks ───────────────────────────────────────────────────────────

  async fn acquire_writelock<'a>(
    &'a self,
    language_id: Uuid,
    owner: &'a str,
    session_key: &'a str,
  ) -> Result<SubtitleLanguage> {
    let mut branch = self.require_branch(language_id).await?;
    let now = Utc::now();

    if let Some(lock) = &branch.writelock
      && !lock.yields_to(session_key, now, self.options.writelock_expiry)
    {
      return Err(Error::WriteLocked { owner: lock.owner.clone() });
    }

    let id_str    = encode_uuid(language_id);
    let prev_key  = branch.writelock.as_ref().map(|l| l.session_key.clone());
    let owner_str = owner.to_owned();
    let key_str   = session_key.to_owned();
    let at_str    = encode_dt(now);

    // Compare-and-set on the previous holder so two sessions cannot both
    // take over an expired lock.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subtitle_languages
           SET writelock_owner = ?2, writelock_session_key = ?3, writelock_time = ?4
           WHERE language_id = ?1 AND writelock_session_key IS ?5",
          rusqlite::params![id_str, owner_str, key_str, at_str, prev_key],
        )?)
      })
      .await?;

    if changed == 0 {
      let holder = self
        .require_branch(language_id)
        .await?
        .writelock
        .map(|l| l.owner)
        .unwrap_or_default();
      return Err(Error::WriteLocked { owner: holder });
    }

    debug!(%language_id, %owner, "write-lock acquired");
    branch.writelock = Some(WriteLock {
      owner:       owner.to_owned(),
      session_key: session_key.to_owned(),
      acquired_at: now,
    });
    Ok(branch)
  }

  async fn release_writelock<'a>(
    &'a self,
    language_id: Uuid,
    session_key: &'a str,
  ) -> Result<SubtitleLanguage> {
    let mut branch = self.require_branch(language_id).await?;

    let Some(lock) = branch.writelock.clone() else {
      return Ok(branch);
    };
    if lock.session_key != session_key
      && !lock.is_expired(Utc::now(), self.options.writelock_expiry)
    {
      return Err(Error::WriteLocked { owner: lock.owner.clone() });
    }

    if !self.clear_writelock(language_id, &lock.session_key).await? {
      // Taken over between the read and the update.
      let current = self.require_branch(language_id).await?;
      if let Some(holder) = &current.writelock {
        return Err(Error::WriteLocked { owner: holder.owner.clone() });
      }
      return Ok(current);
    }

    debug!(%language_id, "write-lock released");
    branch.writelock = None;
    Ok(branch)
  }

  // ── Collaborators ─────────────────────────────────────────────────────────

  async fn save_collaborator<'a>(
    &'a self,
    language_id: Uuid,
    user_id: &'a str,
    state: CollaboratorState,
  ) -> Result<Collaborator> {
    self.require_branch(language_id).await?;

    let new_id_str = encode_uuid(Uuid::new_v4());
    let lang_str   = encode_uuid(language_id);
    let user       = user_id.to_owned();
    let now_str    = encode_dt(Utc::now());

    let raw: RawCollaborator = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO collaborators (
             collaborator_id, user_id, language_id, signoff, signoff_is_official,
             expired, expiration_start, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
           ON CONFLICT (user_id, language_id) DO UPDATE SET
             signoff             = excluded.signoff,
             signoff_is_official = excluded.signoff_is_official,
             expired             = excluded.expired",
          rusqlite::params![
            new_id_str,
            user,
            lang_str,
            state.signoff,
            state.signoff_is_official,
            state.expired,
            now_str,
          ],
        )?;
        Ok(conn.query_row(
          &format!("{COLLABORATOR_SELECT} WHERE user_id = ?1 AND language_id = ?2"),
          rusqlite::params![user, lang_str],
          collaborator_row,
        )?)
      })
      .await?;

    let collaborator = raw.into_collaborator()?;
    self.recompute_signoffs(language_id).await?;
    Ok(collaborator)
  }

  async fn list_collaborators(&self, language_id: Uuid) -> Result<Vec<Collaborator>> {
    let lang_str = encode_uuid(language_id);
    let raws: Vec<RawCollaborator> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{COLLABORATOR_SELECT} WHERE language_id = ?1 ORDER BY created_at, user_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![lang_str], collaborator_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCollaborator::into_collaborator).collect()
  }

  async fn recompute_signoffs(&self, language_id: Uuid) -> Result<SignoffCounts> {
    let collaborators = self.list_collaborators(language_id).await?;
    let counts = SignoffCounts::tally(&collaborators);

    let lang_str = encode_uuid(language_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subtitle_languages SET
             official_signoff_count          = ?2,
             unofficial_signoff_count        = ?3,
             pending_signoff_count           = ?4,
             pending_signoff_expired_count   = ?5,
             pending_signoff_unexpired_count = ?6
           WHERE language_id = ?1",
          rusqlite::params![
            lang_str,
            counts.official,
            counts.unofficial,
            counts.pending,
            counts.pending_expired,
            counts.pending_unexpired,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::BranchNotFound(language_id));
    }
    debug!(%language_id, ?counts, "signoff counts recomputed");
    Ok(counts)
  }
}
