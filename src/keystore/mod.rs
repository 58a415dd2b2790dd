//! The keychain: a searchable index of public keys.
//!
//! The keychain maps fingerprints to key material and to the email
//! identities associated with that key. The lifecycle only adds a key here
//! once its owner has shown they control one of the emails the key claims,
//! so an email found in the keychain for a fingerprint is trusted.
//!
//! The [`Keychain`] trait is what the lifecycle depends on. The crate ships
//! a SQLite implementation, `KeyStore`, behind the `keystore` feature.
//!
//! # Basic Usage
//!
//! ```no_run
//! # #[cfg(feature = "keystore")]
//! # fn example() -> gpgkeychain::Result<()> {
//! use gpgkeychain::{Keychain, KeyStore};
//!
//! let store = KeyStore::open("keychain.db")?;
//! store.add(&std::fs::read_to_string("alice.asc")?)?;
//!
//! for email in store.emails_for_fingerprint("DCA15759D39E8B0FE81835838A274C0AA812C0EE")? {
//!     println!("{}", email);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # In-Memory Store for Testing
//!
//! ```
//! # #[cfg(feature = "keystore")]
//! # {
//! use gpgkeychain::KeyStore;
//!
//! let store = KeyStore::open_in_memory().unwrap();
//! assert_eq!(store.count().unwrap(), 0);
//! # }
//! ```

#[cfg(feature = "keystore")]
mod schema;
#[cfg(feature = "keystore")]
mod store;

#[cfg(feature = "keystore")]
pub use store::*;

use crate::error::Result;

/// An external store of public keys indexed by fingerprint.
///
/// Implementations report their own failures as [`Error::Keychain`].
///
/// [`Error::Keychain`]: crate::Error::Keychain
pub trait Keychain {
    /// Add every certificate in an armored key block.
    fn add(&self, armored_key: &str) -> Result<()>;

    /// Remove the key with this fingerprint.
    ///
    /// Callers treat removal as best-effort; removing a fingerprint that is
    /// not present should not be reported as a failure.
    fn remove(&self, fingerprint: &str) -> Result<()>;

    /// Emails the keychain associates with this fingerprint.
    ///
    /// An unknown fingerprint yields an empty list.
    fn emails_for_fingerprint(&self, fingerprint: &str) -> Result<Vec<String>>;
}

impl<K: Keychain + ?Sized> Keychain for &K {
    fn add(&self, armored_key: &str) -> Result<()> {
        (**self).add(armored_key)
    }

    fn remove(&self, fingerprint: &str) -> Result<()> {
        (**self).remove(fingerprint)
    }

    fn emails_for_fingerprint(&self, fingerprint: &str) -> Result<Vec<String>> {
        (**self).emails_for_fingerprint(fingerprint)
    }
}
