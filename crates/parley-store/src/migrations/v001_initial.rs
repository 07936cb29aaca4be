//! v001 -- users, channels and messages.
//!
//! Creates the three entity tables: `users`, `channels` and `messages`.

use rusqlite::Connection;

/// Schema for an empty database (version 0 -> 1).
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY NOT NULL,   -- user id, or 'me' for the session user
    original_id TEXT,                        -- real id of the 'me' row
    role        TEXT NOT NULL,
    name        TEXT,
    image       TEXT,
    created_at  TEXT,                        -- RFC-3339
    updated_at  TEXT,
    last_active TEXT,
    invisible   INTEGER NOT NULL DEFAULT 0,
    banned      INTEGER NOT NULL DEFAULT 0,
    mutes       TEXT NOT NULL DEFAULT '[]',  -- JSON array of user ids
    extra_data  TEXT NOT NULL DEFAULT '{}'   -- JSON object
);

-- ----------------------------------------------------------------
-- Channels
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS channels (
    cid                TEXT PRIMARY KEY NOT NULL,  -- "{type}:{id}"
    type               TEXT NOT NULL,
    channel_id         TEXT NOT NULL,
    cooldown           INTEGER NOT NULL DEFAULT 0,
    frozen             INTEGER NOT NULL DEFAULT 0,
    hidden             INTEGER,                    -- nullable boolean
    created_by_user_id TEXT NOT NULL,
    member_count       INTEGER NOT NULL DEFAULT 0,
    last_message_id    TEXT,
    last_message_at    TEXT,
    created_at         TEXT,
    updated_at         TEXT,
    deleted_at         TEXT,
    team               TEXT NOT NULL DEFAULT '',
    extra_data         TEXT NOT NULL DEFAULT '{}',
    sync_status        INTEGER NOT NULL            -- SyncStatus code
);

CREATE INDEX IF NOT EXISTS idx_channels_sync_status ON channels(sync_status, cid);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id                 TEXT PRIMARY KEY NOT NULL,
    cid                TEXT NOT NULL,
    user_id            TEXT NOT NULL,
    text               TEXT NOT NULL DEFAULT '',
    attachments        TEXT NOT NULL DEFAULT '[]', -- JSON array
    mentioned_user_ids TEXT NOT NULL DEFAULT '[]', -- JSON array
    created_at         TEXT,
    created_locally_at TEXT,
    updated_at         TEXT,
    updated_locally_at TEXT,
    deleted_at         TEXT,
    extra_data         TEXT NOT NULL DEFAULT '{}',
    sync_status        INTEGER NOT NULL,
    sync_description   TEXT
);

CREATE INDEX IF NOT EXISTS idx_messages_cid_created
    ON messages(cid, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_messages_sync_status ON messages(sync_status, id);
"#;

/// Create the entity tables and their indexes.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
