//! Error types for the gpgkeychain library.
//!
//! Validation failures (`MalformedKey`, `DuplicateKey`, `DuplicateFingerprint`)
//! are always raised before anything durable is written. Storage and keychain
//! failures come from the collaborators the lifecycle drives.

use thiserror::Error;

use crate::types::OwnerId;

/// The marker every submitted public key must begin with.
pub const KEY_PREFIX: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----";

/// The main error type for gpgkeychain operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The armored key is not a single parseable public key block
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// The exact armored key text is already registered
    #[error("Key has already been taken")]
    DuplicateKey,

    /// Another registered key derives the same fingerprint
    #[error("Fingerprint has already been taken: {0}")]
    DuplicateFingerprint(String),

    /// The record store failed
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// The keychain store failed
    #[error("Keychain operation failed: {0}")]
    Keychain(String),

    /// Requested key was not found
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The owner is not known to the account directory
    #[error("Unknown owner: {0}")]
    UnknownOwner(OwnerId),

    /// Configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error (keystore feature)
    #[cfg(feature = "keystore")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic error from anyhow
    #[error("Error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl Error {
    /// The error raised when the key text fails its format check.
    pub(crate) fn invalid_format() -> Self {
        Error::MalformedKey(format!(
            "is invalid. A valid public GPG key begins with '{}'",
            KEY_PREFIX
        ))
    }

    /// True for the errors that reject a key before it is persisted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MalformedKey(_) | Error::DuplicateKey | Error::DuplicateFingerprint(_)
        )
    }
}

/// A specialized Result type for gpgkeychain operations.
pub type Result<T> = std::result::Result<T, Error>;
