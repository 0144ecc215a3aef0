//! SQL schema for the Courtside session store.
//!
//! Applied once at connection startup. `PRAGMA user_version` records which
//! version of this schema a file carries.

pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per persisted value: 'token' | 'active_team' | 'teams'.
-- Each row is written and cleared independently.
CREATE TABLE IF NOT EXISTS session_state (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL   -- RFC 3339 UTC
);

PRAGMA user_version = 1;
";
