//! In-memory record store.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::error::{Error, Result};
use crate::types::{GpgKeyRecord, NewGpgKey, OwnerId};

use super::GpgKeyStore;

/// A [`GpgKeyStore`] that keeps records in memory.
///
/// Useful for tests and for embedding the lifecycle where records are
/// persisted elsewhere. Writes take effect immediately; there is no
/// transaction support.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    records: Vec<GpgKeyRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize> {
        Ok(self.lock()?.records.len())
    }

    /// All records owned by `owner_id`, oldest first.
    pub fn list_for_owner(&self, owner_id: OwnerId) -> Result<Vec<GpgKeyRecord>> {
        Ok(self
            .lock()?
            .records
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Persistence("record store lock poisoned".to_string()))
    }
}

impl GpgKeyStore for MemoryRecordStore {
    fn save(&self, key: NewGpgKey) -> Result<GpgKeyRecord> {
        let mut inner = self.lock()?;

        if inner.records.iter().any(|r| r.key == key.key) {
            return Err(Error::DuplicateKey);
        }
        if inner.records.iter().any(|r| r.fingerprint == key.fingerprint) {
            return Err(Error::DuplicateFingerprint(key.fingerprint));
        }

        inner.next_id += 1;
        let record = GpgKeyRecord {
            id: inner.next_id,
            owner_id: key.owner_id,
            key: key.key,
            fingerprint: key.fingerprint,
            created_at: Utc::now(),
        };
        inner.records.push(record.clone());

        Ok(record)
    }

    fn delete(&self, record: &GpgKeyRecord) -> Result<()> {
        let mut inner = self.lock()?;
        let before = inner.records.len();
        inner.records.retain(|r| r.id != record.id);

        if inner.records.len() == before {
            return Err(Error::KeyNotFound(record.fingerprint.clone()));
        }

        Ok(())
    }

    fn find_by_armored_key(&self, key: &str) -> Result<Option<GpgKeyRecord>> {
        Ok(self.lock()?.records.iter().find(|r| r.key == key).cloned())
    }

    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<GpgKeyRecord>> {
        Ok(self
            .lock()?
            .records
            .iter()
            .find(|r| r.fingerprint == fingerprint)
            .cloned())
    }
}
