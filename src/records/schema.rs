//! Database schema and migrations for the key record store.

use rusqlite::Connection;

use crate::internal::{init_versioned_schema, Migration};

const MIGRATIONS: &[Migration] = &[migrate_v1];

/// Current schema version.
pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    init_versioned_schema(conn, MIGRATIONS)
}

/// Migration to version 1 - initial schema.
fn migrate_v1(conn: &Connection) -> rusqlite::Result<()> {
    // Key text and fingerprint are both unique; the store maps the
    // constraint names back to the matching duplicate errors.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS gpg_keys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            key TEXT NOT NULL UNIQUE,
            fingerprint TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_gpg_keys_owner_id ON gpg_keys(owner_id)",
        [],
    )?;

    Ok(())
}
