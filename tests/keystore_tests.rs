//! End-to-end tests with the SQLite keychain and record store.

#![cfg(feature = "keystore")]

mod common;

use common::*;
use gpgkeychain::{
    Config, EmailStatus, Error, GpgKeyStore, KeyLifecycle, KeyStore, KeychainSync, RecordStore,
};
use tempfile::TempDir;

// =============================================================================
// Committed creation
// =============================================================================

#[test]
fn test_create_committed_notifies_after_commit() {
    init_tracing();
    let keychain = KeyStore::open_in_memory().unwrap();
    let notifier = RecordingNotifier::new();
    let lifecycle = KeyLifecycle::new(&keychain, accounts(), &notifier);
    let mut records = RecordStore::open_in_memory().unwrap();

    let (record, sync) = lifecycle
        .create_committed(&mut records, &fixture("alice.asc"), ALICE_ID)
        .unwrap();

    assert!(matches!(sync, KeychainSync::Added));
    assert_eq!(notifier.count(), 1);
    assert_eq!(notifier.delivered.borrow()[0].id, record.id);

    assert_eq!(records.count().unwrap(), 1);
    assert!(keychain.contains(ALICE_FP).unwrap());

    let statuses = lifecycle.emails_with_verified_status(&record).unwrap();
    assert_eq!(
        statuses,
        vec![
            EmailStatus::new("a@x.com", true),
            EmailStatus::new("b@x.com", false),
        ]
    );
}

#[test]
fn test_create_committed_rejects_duplicate() {
    let keychain = KeyStore::open_in_memory().unwrap();
    let notifier = RecordingNotifier::new();
    let lifecycle = KeyLifecycle::new(&keychain, accounts(), &notifier);
    let mut records = RecordStore::open_in_memory().unwrap();

    lifecycle
        .create_committed(&mut records, &fixture("alice.asc"), ALICE_ID)
        .unwrap();
    let err = lifecycle
        .create_committed(&mut records, &fixture("alice_commented.asc"), ALICE_ID)
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateFingerprint(_)));
    assert_eq!(records.count().unwrap(), 1);
    assert_eq!(notifier.count(), 1);
}

#[test]
fn test_rolled_back_creation_never_notifies() {
    init_tracing();
    let keychain = SpyKeychain::new();
    let notifier = RecordingNotifier::new();
    let lifecycle = KeyLifecycle::new(&keychain, accounts(), &notifier);
    let mut records = RecordStore::open_in_memory().unwrap();

    {
        let tx = records.transaction().unwrap();
        let created = lifecycle
            .create(&tx, &fixture("bob.asc"), BOB_ID)
            .unwrap();
        assert!(tx.find_by_fingerprint(BOB_FP).unwrap().is_some());

        tx.rollback().unwrap();
        drop(created.notification);
    }

    assert_eq!(records.count().unwrap(), 0);
    assert_eq!(notifier.count(), 0);
}

#[test]
fn test_dropped_transaction_discards_record() {
    let keychain = SpyKeychain::new();
    let notifier = RecordingNotifier::new();
    let lifecycle = KeyLifecycle::new(&keychain, accounts(), &notifier);
    let mut records = RecordStore::open_in_memory().unwrap();

    {
        let tx = records.transaction().unwrap();
        let _created = lifecycle
            .create(&tx, &fixture("bob.asc"), BOB_ID)
            .unwrap();
    }

    assert!(records.find_by_fingerprint(BOB_FP).unwrap().is_none());

    // The same key can be registered again afterwards
    let (record, _) = lifecycle
        .create_committed(&mut records, &fixture("bob.asc"), BOB_ID)
        .unwrap();
    assert_eq!(record.fingerprint, BOB_FP);
    assert_eq!(notifier.count(), 1);
}

#[test]
fn test_failed_commit_drops_notification_and_keychain_entry() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let records_path = dir.path().join("records.db");
    let config = Config {
        records_path: Some(records_path.clone()),
        busy_timeout_secs: 1,
        ..Config::default()
    };

    let keychain = KeyStore::open_in_memory().unwrap();
    let notifier = RecordingNotifier::new();
    let lifecycle = KeyLifecycle::new(&keychain, accounts(), &notifier);
    let mut records = config.open_records().unwrap();

    // An open read transaction elsewhere keeps the commit from taking its write lock
    let reader = rusqlite::Connection::open(&records_path).unwrap();
    reader.execute_batch("BEGIN").unwrap();
    let _: i64 = reader
        .query_row("SELECT COUNT(*) FROM gpg_keys", [], |row| row.get(0))
        .unwrap();

    let err = lifecycle
        .create_committed(&mut records, &fixture("alice.asc"), ALICE_ID)
        .unwrap_err();

    assert!(matches!(err, Error::Persistence(_)), "unexpected error: {err:?}");
    assert_eq!(notifier.count(), 0);
    assert!(!keychain.contains(ALICE_FP).unwrap());

    reader.execute_batch("ROLLBACK").unwrap();
    drop(reader);

    assert_eq!(records.count().unwrap(), 0);
}

// =============================================================================
// Destruction
// =============================================================================

#[test]
fn test_destroy_removes_from_sqlite_keychain() {
    let keychain = KeyStore::open_in_memory().unwrap();
    let notifier = RecordingNotifier::new();
    let lifecycle = KeyLifecycle::new(&keychain, accounts(), &notifier);
    let mut records = RecordStore::open_in_memory().unwrap();

    let (record, _) = lifecycle
        .create_committed(&mut records, &fixture("bob.asc"), BOB_ID)
        .unwrap();
    assert!(keychain.contains(BOB_FP).unwrap());

    lifecycle.destroy(&records, &record).unwrap();

    assert!(!keychain.contains(BOB_FP).unwrap());
    assert!(records.find_by_id(record.id).unwrap().is_none());
    assert!(lifecycle.emails(&record).unwrap().is_empty());
}

#[test]
fn test_destroy_skipped_key_leaves_keychain_untouched() {
    let keychain = KeyStore::open_in_memory().unwrap();
    keychain.import_key(&fixture("bob.asc")).unwrap();
    let notifier = RecordingNotifier::new();
    let lifecycle = KeyLifecycle::new(&keychain, accounts(), &notifier);
    let mut records = RecordStore::open_in_memory().unwrap();

    let (record, sync) = lifecycle
        .create_committed(&mut records, &fixture("alice.asc"), CAROL_ID)
        .unwrap();
    assert!(matches!(sync, KeychainSync::Skipped));

    // Removing a fingerprint the keychain never had is not an error
    lifecycle.destroy(&records, &record).unwrap();
    assert_eq!(keychain.count().unwrap(), 1);
}

// =============================================================================
// Persistence across restarts
// =============================================================================

#[test]
fn test_stores_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        keychain_path: Some(dir.path().join("keychain.db")),
        records_path: Some(dir.path().join("records.db")),
        ..Config::default()
    };

    let id = {
        let keychain = config.open_keychain().unwrap();
        let mut records = config.open_records().unwrap();
        let notifier = RecordingNotifier::new();
        let lifecycle = KeyLifecycle::new(&keychain, accounts(), &notifier);

        let (record, _) = lifecycle
            .create_committed(&mut records, &fixture("alice.asc"), ALICE_ID)
            .unwrap();
        record.id
    };

    let keychain = config.open_keychain().unwrap();
    let records = config.open_records().unwrap();

    let record = records.find_by_id(id).unwrap().unwrap();
    assert_eq!(record.fingerprint, ALICE_FP);
    assert_eq!(records.list_for_owner(ALICE_ID).unwrap().len(), 1);
    assert_eq!(
        keychain.emails(ALICE_FP).unwrap(),
        vec!["a@x.com".to_string(), "b@x.com".to_string()]
    );
    assert_eq!(keychain.search_by_email("A@X.COM").unwrap(), vec![ALICE_FP.to_string()]);
}

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let keychain_path = dir.path().join("keychain.db");
    let config_path = dir.path().join("gpgkeychain.toml");
    std::fs::write(
        &config_path,
        format!(
            "keychain_path = {:?}\nbusy_timeout_secs = 1\n",
            keychain_path.to_string_lossy()
        ),
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    assert_eq!(config.keychain_path.as_deref(), Some(keychain_path.as_path()));
    assert!(config.records_path.is_none());

    let keychain = config.open_keychain().unwrap();
    assert_eq!(keychain.path(), Some(keychain_path.as_path()));
    assert!(config.open_records().unwrap().path().is_none());
}
