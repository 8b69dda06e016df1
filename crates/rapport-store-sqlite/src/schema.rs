//! SQL schema for the Rapport SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    contact_id       TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL REFERENCES users(user_id),
    display_name     TEXT NOT NULL,
    email            TEXT,                        -- lower-cased; the merge key
    network_strength TEXT NOT NULL DEFAULT 'LOW', -- 'HIGH' | 'MEDIUM' | 'LOW'
    created_at       TEXT NOT NULL
);

-- Interaction events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS interaction_events (
    event_id    TEXT PRIMARY KEY,
    contact_id  TEXT NOT NULL REFERENCES contacts(contact_id),
    kind        TEXT NOT NULL,   -- 'email' | 'meeting'
    occurred_at TEXT NOT NULL,   -- ISO 8601 UTC
    source_ref  TEXT NOT NULL,   -- provider record id; per-contact dedup key
    recorded_at TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    UNIQUE (contact_id, source_ref)
);

CREATE TABLE IF NOT EXISTS integrations (
    integration_id TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL REFERENCES users(user_id),
    grant_id       TEXT NOT NULL,
    provider       TEXT NOT NULL,
    status         TEXT NOT NULL,   -- 'syncing' | 'active' | 'error' | 'revoked'
    cursor         TEXT,            -- JSON-encoded SyncCursor or NULL
    created_at     TEXT NOT NULL,
    UNIQUE (user_id, grant_id)
);

CREATE INDEX IF NOT EXISTS contacts_user_idx     ON contacts(user_id);
CREATE INDEX IF NOT EXISTS contacts_email_idx    ON contacts(user_id, email);
CREATE INDEX IF NOT EXISTS events_contact_idx    ON interaction_events(contact_id);
CREATE INDEX IF NOT EXISTS events_occurred_idx   ON interaction_events(occurred_at);
CREATE INDEX IF NOT EXISTS integrations_user_idx ON integrations(user_id);

PRAGMA user_version = 1;
";
