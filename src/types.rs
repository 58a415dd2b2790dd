//! Public type definitions for the gpgkeychain library.
//!
//! This module contains the data structures passed between the parser,
//! validator, stores and lifecycle coordinator.

use chrono::{DateTime, Utc};

use crate::error::Error;

/// Identifier of the account that owns a key.
pub type OwnerId = i64;

/// Fingerprints and email identities found in an armored key block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// Primary key fingerprints, one per certificate in the block
    pub fingerprints: Vec<String>,
    /// Email addresses from the user IDs, in packet order, without repeats
    pub emails: Vec<String>,
}

/// A key that passed validation and is about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGpgKey {
    /// The account submitting the key
    pub owner_id: OwnerId,
    /// Normalized armored key text
    pub key: String,
    /// Fingerprint derived from `key`
    pub fingerprint: String,
}

/// A persisted GPG key.
///
/// Records are immutable: `key` and `fingerprint` never change after
/// creation. Replacing a key means destroying the record and creating
/// a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpgKeyRecord {
    /// Store-assigned identifier
    pub id: i64,
    /// The account that registered the key
    pub owner_id: OwnerId,
    /// Armored key text exactly as validated
    pub key: String,
    /// Uppercase hex fingerprint of the primary key
    pub fingerprint: String,
    /// When the record was persisted
    pub created_at: DateTime<Utc>,
}

/// An email embedded in a key, with whether it counts as verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailStatus {
    pub email: String,
    pub verified: bool,
}

impl EmailStatus {
    pub fn new(email: impl Into<String>, verified: bool) -> Self {
        Self {
            email: email.into(),
            verified,
        }
    }
}

/// Where a key record is in its lifecycle.
///
/// `Proposed` and `Validated` only exist while a creation attempt is
/// running; nothing durable is written before `Persisted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Proposed,
    Validated,
    Persisted,
    Synced,
    Removed,
}

impl std::fmt::Display for KeyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyState::Proposed => write!(f, "proposed"),
            KeyState::Validated => write!(f, "validated"),
            KeyState::Persisted => write!(f, "persisted"),
            KeyState::Synced => write!(f, "synced"),
            KeyState::Removed => write!(f, "removed"),
        }
    }
}

/// Outcome of the keychain step of a key creation.
#[derive(Debug)]
pub enum KeychainSync {
    /// The key was added to the keychain
    Added,
    /// The owner's email is not among the key's identities
    Skipped,
    /// The keychain rejected the key; the record stays persisted
    Failed(Error),
}

impl KeychainSync {
    /// Lifecycle state the record reached.
    pub fn state(&self) -> KeyState {
        match self {
            KeychainSync::Added => KeyState::Synced,
            KeychainSync::Skipped | KeychainSync::Failed(_) => KeyState::Persisted,
        }
    }

    /// The keychain error, if the key was persisted without being synced.
    pub fn warning(&self) -> Option<&Error> {
        match self {
            KeychainSync::Failed(err) => Some(err),
            _ => None,
        }
    }
}
