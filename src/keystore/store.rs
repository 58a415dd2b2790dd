//! KeyStore implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::config::DEFAULT_BUSY_TIMEOUT;
use crate::error::{Error, Result};
use crate::internal::{fingerprint_to_hex, normalize_fingerprint, parse_public_keys, user_ids};
use crate::parse::extract_email;

use super::schema::init_schema;
use super::Keychain;

/// SQLite-backed keychain.
///
/// Stores armored public certificates and indexes them by fingerprint,
/// key ID and email for lookup.
///
/// # Database Schema
///
/// The keychain uses two tables:
/// - `certificates`: Stores the armored certificate and metadata
/// - `user_ids`: Indexes user IDs and emails for search
///
/// # Thread Safety
///
/// The `KeyStore` is not `Sync` due to the underlying SQLite connection.
/// For multi-threaded access, create a separate `KeyStore` instance per thread
/// or use external synchronization.
pub struct KeyStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl KeyStore {
    /// Open or create a keychain at the given path.
    ///
    /// If the database file doesn't exist, it will be created with the
    /// appropriate schema. Parent directories must already exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open or create a keychain, waiting at most `busy_timeout` on locks.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;

        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        init_schema(&conn)?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Create an in-memory keychain.
    ///
    /// # Example
    ///
    /// ```
    /// use gpgkeychain::KeyStore;
    ///
    /// let store = KeyStore::open_in_memory().unwrap();
    /// assert!(store.path().is_none());
    /// assert_eq!(store.count().unwrap(), 0);
    /// ```
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        init_schema(&conn)?;

        Ok(Self { conn, path: None })
    }

    /// Import every certificate in an armored key block.
    ///
    /// Existing certificates with the same fingerprint are replaced along
    /// with their user ID index.
    ///
    /// # Returns
    /// The fingerprints of the imported certificates.
    pub fn import_key(&self, armored_key: &str) -> Result<Vec<String>> {
        let keys = parse_public_keys(armored_key.as_bytes())?;
        let mut fingerprints = Vec::with_capacity(keys.len());

        // A block is indexed completely or not at all
        let tx = self.conn.unchecked_transaction()?;

        for public_key in &keys {
            let fingerprint = fingerprint_to_hex(&public_key.primary_key);
            let uids = user_ids(public_key);

            tx.execute(
                "INSERT OR REPLACE INTO certificates (fingerprint, cert_data, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)",
                params![&fingerprint, armored_key],
            )?;

            tx.execute("DELETE FROM user_ids WHERE fingerprint = ?1", [&fingerprint])?;

            for uid in &uids {
                tx.execute(
                    "INSERT OR IGNORE INTO user_ids (fingerprint, uid, email) VALUES (?1, ?2, ?3)",
                    params![&fingerprint, uid, extract_email(uid)],
                )?;
            }

            debug!(fingerprint = %fingerprint, uids = uids.len(), "imported key into keychain");
            fingerprints.push(fingerprint);
        }

        tx.commit()?;
        Ok(fingerprints)
    }

    /// Export the armored key stored under a fingerprint.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if no key with the given fingerprint exists.
    pub fn export_key(&self, fingerprint: &str) -> Result<String> {
        let fingerprint = normalize_fingerprint(fingerprint);
        self.conn
            .query_row(
                "SELECT cert_data FROM certificates WHERE fingerprint = ?1",
                [&fingerprint],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::KeyNotFound(fingerprint))
    }

    /// Check if a key exists by fingerprint.
    pub fn contains(&self, fingerprint: &str) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM certificates WHERE fingerprint = ?1",
            [normalize_fingerprint(fingerprint)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete a key by fingerprint.
    ///
    /// Removes the certificate and its user ID index entries.
    ///
    /// # Errors
    /// Returns `Error::KeyNotFound` if no key with the given fingerprint exists.
    pub fn delete_key(&self, fingerprint: &str) -> Result<()> {
        let fingerprint = normalize_fingerprint(fingerprint);
        let rows = self.conn.execute(
            "DELETE FROM certificates WHERE fingerprint = ?1",
            [&fingerprint],
        )?;

        if rows == 0 {
            return Err(Error::KeyNotFound(fingerprint));
        }

        Ok(())
    }

    /// Emails indexed for a fingerprint, in the order they were imported.
    pub fn emails(&self, fingerprint: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT email FROM user_ids
             WHERE fingerprint = ?1 AND email IS NOT NULL
             ORDER BY id",
        )?;

        let rows = stmt.query_map([normalize_fingerprint(fingerprint)], |row| {
            row.get::<_, String>(0)
        })?;

        let mut emails: Vec<String> = Vec::new();
        for row in rows {
            let email = row?;
            if !emails.contains(&email) {
                emails.push(email);
            }
        }

        Ok(emails)
    }

    /// Fingerprints of all keys carrying this email (case-insensitive).
    pub fn search_by_email(&self, email: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT c.fingerprint FROM certificates c
             JOIN user_ids u ON c.fingerprint = u.fingerprint
             WHERE LOWER(u.email) = ?1
             ORDER BY c.updated_at DESC",
        )?;

        let rows = stmt.query_map([email.to_lowercase()], |row| row.get(0))?;

        let mut fingerprints = Vec::new();
        for row in rows {
            fingerprints.push(row?);
        }

        Ok(fingerprints)
    }

    /// Get the number of keys in the keychain.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM certificates", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Database path, or `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Keychain for KeyStore {
    fn add(&self, armored_key: &str) -> Result<()> {
        self.import_key(armored_key).map(|_| ()).map_err(keychain)
    }

    fn remove(&self, fingerprint: &str) -> Result<()> {
        match self.delete_key(fingerprint) {
            Ok(()) => Ok(()),
            Err(Error::KeyNotFound(fp)) => {
                debug!(fingerprint = %fp, "key already absent from keychain");
                Ok(())
            }
            Err(e) => Err(keychain(e)),
        }
    }

    fn emails_for_fingerprint(&self, fingerprint: &str) -> Result<Vec<String>> {
        self.emails(fingerprint).map_err(keychain)
    }
}

fn keychain(err: Error) -> Error {
    match err {
        Error::Keychain(_) => err,
        other => Error::Keychain(other.to_string()),
    }
}
