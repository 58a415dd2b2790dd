//! Shared fixtures and spy collaborators for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;

use gpgkeychain::{parse_key, Error, GpgKeyRecord, Keychain, Notifier, OwnerId, Result};

pub const ALICE_FP: &str = "DCA15759D39E8B0FE81835838A274C0AA812C0EE";
pub const BOB_FP: &str = "161B4B495758559D599DCAB794A8E01F2D2B2DEA";
pub const NAMELESS_FP: &str = "A4A9C7C1D02037300F3DAB898B008F4C39B1FF1B";

pub const ALICE_ID: OwnerId = 1;
pub const BOB_ID: OwnerId = 2;
pub const CAROL_ID: OwnerId = 3;

/// Base path for test files.
pub fn test_files_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("files")
}

pub fn fixture(name: &str) -> String {
    let path = test_files_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read file: {:?}", path))
}

/// Alice owns a@x.com (claimed by alice.asc), Bob owns bob@example.com,
/// Carol owns an address no fixture claims.
pub fn accounts() -> HashMap<OwnerId, String> {
    HashMap::from([
        (ALICE_ID, "a@x.com".to_string()),
        (BOB_ID, "bob@example.com".to_string()),
        (CAROL_ID, "carol@example.com".to_string()),
    ])
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gpgkeychain=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A keychain that records every call and can be told to fail.
#[derive(Default)]
pub struct SpyKeychain {
    pub added: RefCell<Vec<String>>,
    pub removed: RefCell<Vec<String>>,
    pub emails: RefCell<HashMap<String, Vec<String>>>,
    pub fail_add: Cell<bool>,
    pub fail_remove: Cell<bool>,
}

impl SpyKeychain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override what the keychain reports for a fingerprint.
    pub fn set_emails(&self, fingerprint: &str, emails: &[&str]) {
        self.emails.borrow_mut().insert(
            fingerprint.to_string(),
            emails.iter().map(|e| e.to_string()).collect(),
        );
    }

    pub fn add_count(&self) -> usize {
        self.added.borrow().len()
    }
}

impl Keychain for SpyKeychain {
    fn add(&self, armored_key: &str) -> Result<()> {
        self.added.borrow_mut().push(armored_key.to_string());
        if self.fail_add.get() {
            return Err(Error::Keychain("keychain unavailable".to_string()));
        }

        let parsed = parse_key(armored_key)?;
        for fingerprint in parsed.fingerprints {
            self.emails
                .borrow_mut()
                .insert(fingerprint, parsed.emails.clone());
        }
        Ok(())
    }

    fn remove(&self, fingerprint: &str) -> Result<()> {
        self.removed.borrow_mut().push(fingerprint.to_string());
        if self.fail_remove.get() {
            return Err(Error::Keychain("keychain unavailable".to_string()));
        }

        self.emails.borrow_mut().remove(fingerprint);
        Ok(())
    }

    fn emails_for_fingerprint(&self, fingerprint: &str) -> Result<Vec<String>> {
        Ok(self
            .emails
            .borrow()
            .get(fingerprint)
            .cloned()
            .unwrap_or_default())
    }
}

/// A notifier that remembers what it was asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    pub delivered: RefCell<Vec<GpgKeyRecord>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.delivered.borrow().len()
    }
}

impl Notifier for RecordingNotifier {
    fn new_gpg_key(&self, record: &GpgKeyRecord) {
        self.delivered.borrow_mut().push(record.clone());
    }
}
