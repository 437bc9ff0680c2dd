//! SQL schema for the subvers SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Branches. Never deleted once they have versions.
CREATE TABLE IF NOT EXISTS subtitle_languages (
    language_id                 TEXT PRIMARY KEY,
    video_id                    TEXT NOT NULL,
    language_code               TEXT NOT NULL,
    created_at                  TEXT NOT NULL,
    writelock_owner             TEXT,
    writelock_session_key       TEXT,
    writelock_time              TEXT,
    official_signoff_count      INTEGER NOT NULL DEFAULT 0,
    unofficial_signoff_count    INTEGER NOT NULL DEFAULT 0,
    pending_signoff_count       INTEGER NOT NULL DEFAULT 0,
    pending_signoff_expired_count   INTEGER NOT NULL DEFAULT 0,
    pending_signoff_unexpired_count INTEGER NOT NULL DEFAULT 0,
    UNIQUE (video_id, language_code)
);

-- Commits. Only the visibility columns are ever updated.
CREATE TABLE IF NOT EXISTS subtitle_versions (
    version_id           TEXT PRIMARY KEY,
    language_id          TEXT NOT NULL REFERENCES subtitle_languages(language_id),
    video_id             TEXT NOT NULL,    -- denormalised from the branch
    language_code        TEXT NOT NULL,    -- denormalised from the branch
    version_number       INTEGER NOT NULL,
    visibility           TEXT NOT NULL DEFAULT 'public',
    visibility_override  TEXT,             -- NULL = no override
    author               TEXT NOT NULL,
    title                TEXT NOT NULL DEFAULT '',
    description          TEXT NOT NULL DEFAULT '',
    note                 TEXT NOT NULL DEFAULT '',
    created_at           TEXT NOT NULL,
    serialized_subtitles TEXT NOT NULL DEFAULT '',  -- base64(zlib(DFXP))
    serialized_lineage   TEXT NOT NULL DEFAULT '{}', -- {\"lang\": number}
    UNIQUE (video_id, language_code, version_number),
    CHECK  (version_number >= 1)
);

-- Parent edges of the version DAG; written with their child, never after.
CREATE TABLE IF NOT EXISTS version_parents (
    child_id  TEXT NOT NULL REFERENCES subtitle_versions(version_id),
    parent_id TEXT NOT NULL REFERENCES subtitle_versions(version_id),
    PRIMARY KEY (child_id, parent_id),
    CHECK (child_id != parent_id)
);

CREATE TABLE IF NOT EXISTS collaborators (
    collaborator_id     TEXT PRIMARY KEY,
    user_id             TEXT NOT NULL,
    language_id         TEXT NOT NULL REFERENCES subtitle_languages(language_id),
    signoff             INTEGER NOT NULL DEFAULT 0,
    signoff_is_official INTEGER NOT NULL DEFAULT 0,
    expired             INTEGER NOT NULL DEFAULT 0,
    expiration_start    TEXT NOT NULL,
    created_at          TEXT NOT NULL,
    UNIQUE (user_id, language_id)
);

CREATE INDEX IF NOT EXISTS versions_language_idx ON subtitle_versions(language_id, version_number);
CREATE INDEX IF NOT EXISTS parents_parent_idx    ON version_parents(parent_id);
CREATE INDEX IF NOT EXISTS collaborators_lang_idx ON collaborators(language_id);

PRAGMA user_version = 1;
";
