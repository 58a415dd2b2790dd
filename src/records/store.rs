//! SQLite-backed record store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use tracing::debug;

use crate::config::DEFAULT_BUSY_TIMEOUT;
use crate::error::{Error, Result};
use crate::types::{GpgKeyRecord, NewGpgKey, OwnerId};

use super::schema::init_schema;
use super::GpgKeyStore;

const SELECT_RECORD: &str = "SELECT id, owner_id, key, fingerprint, created_at FROM gpg_keys";

/// SQLite storage for GPG key records.
///
/// Calls on the store itself run in autocommit mode. Use
/// [`RecordStore::transaction`] to group a creation with other writes
/// and only make it durable on [`RecordTransaction::commit`].
///
/// # Thread Safety
///
/// The `RecordStore` is not `Sync` due to the underlying SQLite connection.
/// Open one store per thread; the busy timeout bounds how long a writer
/// waits for another connection's lock.
pub struct RecordStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Open or create a record store at the given path.
    ///
    /// Parent directories must already exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open or create a record store, waiting at most `busy_timeout` on locks.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        init_schema(&conn)?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Create an in-memory record store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;

        Ok(Self { conn, path: None })
    }

    /// Start a transaction. Dropping it without committing rolls back.
    pub fn transaction(&mut self) -> Result<RecordTransaction<'_>> {
        let tx = self.conn.transaction().map_err(persistence)?;
        Ok(RecordTransaction { tx })
    }

    /// Find a record by its store identifier.
    pub fn find_by_id(&self, id: i64) -> Result<Option<GpgKeyRecord>> {
        find_one(&self.conn, "id", &id)
    }

    /// All records owned by `owner_id`, oldest first.
    pub fn list_for_owner(&self, owner_id: OwnerId) -> Result<Vec<GpgKeyRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE owner_id = ?1 ORDER BY id", SELECT_RECORD))
            .map_err(persistence)?;

        let rows = stmt
            .query_map([owner_id], record_from_row)
            .map_err(persistence)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(persistence)?);
        }

        Ok(records)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM gpg_keys", [], |row| row.get(0))
            .map_err(persistence)?;
        Ok(count as usize)
    }

    /// Database path, or `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl GpgKeyStore for RecordStore {
    fn save(&self, key: NewGpgKey) -> Result<GpgKeyRecord> {
        insert_record(&self.conn, key)
    }

    fn delete(&self, record: &GpgKeyRecord) -> Result<()> {
        delete_record(&self.conn, record)
    }

    fn find_by_armored_key(&self, key: &str) -> Result<Option<GpgKeyRecord>> {
        find_one(&self.conn, "key", &key)
    }

    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<GpgKeyRecord>> {
        find_one(&self.conn, "fingerprint", &fingerprint)
    }
}

/// An open transaction on a [`RecordStore`].
pub struct RecordTransaction<'a> {
    tx: Transaction<'a>,
}

impl RecordTransaction<'_> {
    /// Make every write in this transaction durable.
    pub fn commit(self) -> Result<()> {
        self.tx.commit().map_err(persistence)
    }

    /// Discard every write in this transaction.
    pub fn rollback(self) -> Result<()> {
        self.tx.rollback().map_err(persistence)
    }
}

impl GpgKeyStore for RecordTransaction<'_> {
    fn save(&self, key: NewGpgKey) -> Result<GpgKeyRecord> {
        insert_record(&self.tx, key)
    }

    fn delete(&self, record: &GpgKeyRecord) -> Result<()> {
        delete_record(&self.tx, record)
    }

    fn find_by_armored_key(&self, key: &str) -> Result<Option<GpgKeyRecord>> {
        find_one(&self.tx, "key", &key)
    }

    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<GpgKeyRecord>> {
        find_one(&self.tx, "fingerprint", &fingerprint)
    }
}

fn insert_record(conn: &Connection, key: NewGpgKey) -> Result<GpgKeyRecord> {
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO gpg_keys (owner_id, key, fingerprint, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![key.owner_id, &key.key, &key.fingerprint, created_at],
    )
    .map_err(|e| map_insert_error(e, &key.fingerprint))?;

    let id = conn.last_insert_rowid();
    debug!(id, fingerprint = %key.fingerprint, "inserted gpg key record");

    Ok(GpgKeyRecord {
        id,
        owner_id: key.owner_id,
        key: key.key,
        fingerprint: key.fingerprint,
        created_at,
    })
}

fn delete_record(conn: &Connection, record: &GpgKeyRecord) -> Result<()> {
    let rows = conn
        .execute("DELETE FROM gpg_keys WHERE id = ?1", [record.id])
        .map_err(persistence)?;

    if rows == 0 {
        return Err(Error::KeyNotFound(record.fingerprint.clone()));
    }

    Ok(())
}

fn find_one(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<GpgKeyRecord>> {
    conn.query_row(
        &format!("{} WHERE {} = ?1", SELECT_RECORD, column),
        [value],
        record_from_row,
    )
    .optional()
    .map_err(persistence)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<GpgKeyRecord> {
    Ok(GpgKeyRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        key: row.get(2)?,
        fingerprint: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Map UNIQUE constraint failures back to the validation errors they enforce.
fn map_insert_error(err: rusqlite::Error, fingerprint: &str) -> Error {
    if let rusqlite::Error::SqliteFailure(_, Some(msg)) = &err {
        if msg.contains("UNIQUE") && msg.contains("gpg_keys.fingerprint") {
            return Error::DuplicateFingerprint(fingerprint.to_string());
        }
        if msg.contains("UNIQUE") && msg.contains("gpg_keys.key") {
            return Error::DuplicateKey;
        }
    }
    persistence(err)
}

fn persistence(err: rusqlite::Error) -> Error {
    Error::Persistence(err.to_string())
}
