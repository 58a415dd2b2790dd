//! Key record persistence.
//!
//! The lifecycle coordinator never talks to a database directly; it goes
//! through the [`GpgKeyStore`] trait. Two implementations ship with the
//! crate:
//!
//! - [`MemoryRecordStore`]: a mutex-guarded list, always available
//! - `RecordStore`: SQLite-backed, with explicit transactions (`keystore` feature)
//!
//! # Transactions
//!
//! ```no_run
//! # #[cfg(feature = "keystore")]
//! # fn example() -> gpgkeychain::Result<()> {
//! use gpgkeychain::RecordStore;
//!
//! let mut store = RecordStore::open("keys.db")?;
//!
//! let tx = store.transaction()?;
//! // ... save through `tx` ...
//! tx.commit()?; // dropping `tx` instead rolls everything back
//! # Ok(())
//! # }
//! ```

mod memory;
#[cfg(feature = "keystore")]
mod schema;
#[cfg(feature = "keystore")]
mod store;

pub use memory::MemoryRecordStore;
#[cfg(feature = "keystore")]
pub use store::{RecordStore, RecordTransaction};

use crate::error::Result;
use crate::types::{GpgKeyRecord, NewGpgKey};

/// Storage for GPG key records.
///
/// Implementations must enforce uniqueness of both the key text and the
/// fingerprint on `save`, reporting [`Error::DuplicateKey`] and
/// [`Error::DuplicateFingerprint`] respectively, so that two writers racing
/// past [`validate_uniqueness`] cannot both succeed.
///
/// [`Error::DuplicateKey`]: crate::Error::DuplicateKey
/// [`Error::DuplicateFingerprint`]: crate::Error::DuplicateFingerprint
/// [`validate_uniqueness`]: crate::validate_uniqueness
pub trait GpgKeyStore {
    /// Persist a validated key and return the stored record.
    fn save(&self, key: NewGpgKey) -> Result<GpgKeyRecord>;

    /// Remove a record. Fails with `KeyNotFound` if it is already gone.
    fn delete(&self, record: &GpgKeyRecord) -> Result<()>;

    fn find_by_armored_key(&self, key: &str) -> Result<Option<GpgKeyRecord>>;

    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<GpgKeyRecord>>;
}
