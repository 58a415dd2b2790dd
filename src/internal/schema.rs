//! Versioned schema setup shared by the SQLite stores.

use rusqlite::Connection;

/// One schema step. Step `n` (zero-based) brings a database to version `n + 1`.
pub(crate) type Migration = fn(&Connection) -> rusqlite::Result<()>;

/// Bring a database up to `migrations.len()`, running only the steps it is missing.
pub(crate) fn init_versioned_schema(
    conn: &Connection,
    migrations: &[Migration],
) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    let target_version = migrations.len() as u32;
    if current_version >= target_version {
        return Ok(());
    }

    for migration in &migrations[current_version as usize..] {
        migration(conn)?;
    }

    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [target_version],
    )?;

    Ok(())
}
