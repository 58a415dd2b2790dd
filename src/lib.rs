//! # gpgkeychain
//!
//! GPG key identity verification and keychain synchronization, built on
//! [rpgp](https://docs.rs/pgp).
//!
//! Accounts submit armored public keys. This library decides whether a key
//! may be registered, keeps a searchable keychain in step with the
//! registered keys, and reports which of a key's email identities are
//! verified:
//!
//! - **Parsing**: fingerprints and email identities of an armored key block
//! - **Validation**: format, single-fingerprint and uniqueness checks
//! - **Keychain**: fingerprint-indexed key store (SQLite, optional feature)
//! - **Lifecycle**: validate, persist, sync to the keychain, notify after commit
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "keystore")]
//! # fn example() -> gpgkeychain::Result<()> {
//! use std::collections::HashMap;
//! use gpgkeychain::*;
//!
//! let config = Config::default();
//! let mut records = config.open_records()?;
//! let accounts = HashMap::from([(1, "alice@example.com".to_string())]);
//! let lifecycle = KeyLifecycle::new(config.open_keychain()?, accounts, LogNotifier);
//!
//! let armored = std::fs::read_to_string("alice.asc")?;
//! let (record, keychain) = lifecycle.create_committed(&mut records, &armored, 1)?;
//! println!("{} is {}", record.fingerprint, keychain.state());
//!
//! for status in lifecycle.emails_with_verified_status(&record)? {
//!     println!("{} verified={}", status.email, status.verified);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `keystore` (default): SQLite-backed `KeyStore` keychain and `RecordStore`
//!
//! ## Design
//!
//! Every external system is a trait: [`GpgKeyStore`] for records,
//! [`Keychain`] for the key index, [`AccountDirectory`] for owner emails
//! and [`Notifier`] for owner notifications. The lifecycle never commits a
//! transaction itself; it returns a [`PendingNotification`] that the caller
//! dispatches once its commit succeeded.

// Modules
mod error;
mod types;
mod internal;

mod parse;
mod validate;
mod accounts;
mod notify;
mod lifecycle;
mod config;

pub mod keystore;
pub mod records;

// Re-export error types
pub use error::{Error, Result, KEY_PREFIX};

// Re-export all public types
pub use types::{
    EmailStatus,
    GpgKeyRecord,
    KeyState,
    KeychainSync,
    NewGpgKey,
    OwnerId,
    ParsedKey,
};

// Re-export parsing functions
pub use parse::{
    extract_email,
    parse_emails,
    parse_fingerprints,
    parse_key,
};

// Re-export validation functions
pub use validate::{
    derive_fingerprint,
    normalize_key,
    validate_format,
    validate_uniqueness,
};

// Re-export collaborator traits
pub use accounts::AccountDirectory;
pub use keystore::Keychain;
pub use notify::{LogNotifier, Notifier, PendingNotification};
pub use records::{GpgKeyStore, MemoryRecordStore};

pub use lifecycle::{Created, KeyLifecycle};
pub use config::{Config, DEFAULT_BUSY_TIMEOUT};

// Re-export SQLite stores when feature is enabled
#[cfg(feature = "keystore")]
pub use keystore::KeyStore;
#[cfg(feature = "keystore")]
pub use records::{RecordStore, RecordTransaction};
