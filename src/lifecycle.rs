//! Key lifecycle coordination.
//!
//! [`KeyLifecycle`] drives a key from submission to the keychain and back
//! out again:
//!
//! ```text
//! create:  Proposed -> Validated -> Persisted -> Synced
//! destroy: Persisted -> Removed
//! ```
//!
//! Validation happens before anything is written. Persisting the record
//! and registering it in the keychain are two separate operations with no
//! two-phase guarantee: a failure (or crash) between them leaves a persisted
//! record that is not in the keychain yet. [`KeyLifecycle::sync_to_keychain`]
//! is the retry path for that window.

use tracing::{debug, info, warn};

use crate::accounts::AccountDirectory;
use crate::error::Result;
use crate::keystore::Keychain;
use crate::notify::{Notifier, PendingNotification};
use crate::parse::{parse_emails, parse_key};
use crate::records::GpgKeyStore;
use crate::types::{EmailStatus, GpgKeyRecord, KeyState, KeychainSync, NewGpgKey, OwnerId};
use crate::validate::{normalize_key, single_fingerprint, validate_format, validate_uniqueness};

#[cfg(feature = "keystore")]
use crate::records::RecordStore;

/// Result of a successful [`KeyLifecycle::create`].
#[derive(Debug)]
pub struct Created {
    /// The persisted record
    pub record: GpgKeyRecord,
    /// What happened in the keychain; `Failed` is a warning, not an error
    pub keychain: KeychainSync,
    /// Owner notification to dispatch once the record is committed
    pub notification: PendingNotification,
}

impl Created {
    /// Lifecycle state the new record reached.
    pub fn state(&self) -> KeyState {
        self.keychain.state()
    }
}

/// Coordinates validation, persistence, keychain sync and notification.
///
/// The record store is passed to each call rather than held, so a call can
/// run inside whatever transaction the caller has open.
pub struct KeyLifecycle<K, A, N> {
    keychain: K,
    accounts: A,
    notifier: N,
}

impl<K, A, N> KeyLifecycle<K, A, N>
where
    K: Keychain,
    A: AccountDirectory,
    N: Notifier,
{
    pub fn new(keychain: K, accounts: A, notifier: N) -> Self {
        Self {
            keychain,
            accounts,
            notifier,
        }
    }

    pub fn keychain(&self) -> &K {
        &self.keychain
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Register a submitted armored key for `owner_id`.
    ///
    /// Steps, in order:
    /// 1. normalize and check the format
    /// 2. derive exactly one fingerprint
    /// 3. check the key text and fingerprint are not registered yet
    /// 4. persist the record through `store`
    /// 5. add the key to the keychain if the owner's email is one the key claims
    /// 6. return a pending owner notification
    ///
    /// Any error from steps 1-4 means nothing was persisted and no side
    /// effect ran. A keychain failure in step 5 does not fail the call; it is
    /// reported as [`KeychainSync::Failed`] on the returned value.
    pub fn create<S>(&self, store: &S, armored_key: &str, owner_id: OwnerId) -> Result<Created>
    where
        S: GpgKeyStore + ?Sized,
    {
        let key = normalize_key(armored_key);
        debug!(owner = owner_id, state = %KeyState::Proposed, "validating gpg key");

        validate_format(&key)?;
        let parsed = parse_key(&key)?;
        let fingerprint = single_fingerprint(parsed.fingerprints)?;
        validate_uniqueness(&key, &fingerprint, store)?;
        let owner_email = self.accounts.registered_email(owner_id)?;
        debug!(owner = owner_id, fingerprint = %fingerprint, state = %KeyState::Validated, "gpg key validated");

        let record = store.save(NewGpgKey {
            owner_id,
            key,
            fingerprint,
        })?;

        let keychain = self.add_to_keychain(&record, &parsed.emails, &owner_email);

        info!(
            owner = owner_id,
            fingerprint = %record.fingerprint,
            state = %keychain.state(),
            "created gpg key"
        );

        Ok(Created {
            notification: PendingNotification::new(record.clone()),
            record,
            keychain,
        })
    }

    /// Create a key in its own transaction and notify the owner after commit.
    ///
    /// If the commit fails the notification is dropped, and a key that was
    /// already added to the keychain is removed again on a best-effort basis.
    #[cfg(feature = "keystore")]
    pub fn create_committed(
        &self,
        store: &mut RecordStore,
        armored_key: &str,
        owner_id: OwnerId,
    ) -> Result<(GpgKeyRecord, KeychainSync)> {
        let tx = store.transaction()?;
        let created = self.create(&tx, armored_key, owner_id)?;

        if let Err(err) = tx.commit() {
            if matches!(created.keychain, KeychainSync::Added) {
                self.remove_from_keychain(&created.record.fingerprint);
            }
            return Err(err);
        }

        self.dispatch(created.notification);
        Ok((created.record, created.keychain))
    }

    /// Deliver a pending notification through this lifecycle's notifier.
    pub fn dispatch(&self, notification: PendingNotification) {
        notification.dispatch(&self.notifier);
    }

    /// Remove a key record, then remove its fingerprint from the keychain.
    ///
    /// Keychain removal is best-effort: a failure is logged and the call
    /// still succeeds, because the record itself is gone.
    pub fn destroy<S>(&self, store: &S, record: &GpgKeyRecord) -> Result<()>
    where
        S: GpgKeyStore + ?Sized,
    {
        store.delete(record)?;
        self.remove_from_keychain(&record.fingerprint);

        info!(
            owner = record.owner_id,
            fingerprint = %record.fingerprint,
            state = %KeyState::Removed,
            "destroyed gpg key"
        );
        Ok(())
    }

    /// Emails the keychain associates with the record's fingerprint.
    pub fn emails(&self, record: &GpgKeyRecord) -> Result<Vec<String>> {
        self.keychain.emails_for_fingerprint(&record.fingerprint)
    }

    /// Every email embedded in the key, with whether it is verified.
    ///
    /// An email is verified when it is the owner's registered email and the
    /// keychain lists it for this fingerprint. Order follows the key's user
    /// ID packets.
    pub fn emails_with_verified_status(&self, record: &GpgKeyRecord) -> Result<Vec<EmailStatus>> {
        let in_keychain = self.emails(record)?;
        let owner_email = self.accounts.registered_email(record.owner_id)?;

        Ok(parse_emails(&record.key)?
            .into_iter()
            .map(|email| {
                let verified = email == owner_email && in_keychain.contains(&email);
                EmailStatus::new(email, verified)
            })
            .collect())
    }

    /// Re-run the keychain step of creation for an existing record.
    pub fn sync_to_keychain(&self, record: &GpgKeyRecord) -> Result<KeychainSync> {
        let emails = parse_emails(&record.key)?;
        let owner_email = self.accounts.registered_email(record.owner_id)?;
        Ok(self.add_to_keychain(record, &emails, &owner_email))
    }

    fn add_to_keychain(
        &self,
        record: &GpgKeyRecord,
        emails: &[String],
        owner_email: &str,
    ) -> KeychainSync {
        if !emails.iter().any(|email| email == owner_email) {
            debug!(
                fingerprint = %record.fingerprint,
                "owner email not claimed by key, skipping keychain"
            );
            return KeychainSync::Skipped;
        }

        match self.keychain.add(&record.key) {
            Ok(()) => KeychainSync::Added,
            Err(err) => {
                warn!(
                    fingerprint = %record.fingerprint,
                    error = %err,
                    "gpg key persisted but not added to keychain"
                );
                KeychainSync::Failed(err)
            }
        }
    }

    fn remove_from_keychain(&self, fingerprint: &str) {
        if let Err(err) = self.keychain.remove(fingerprint) {
            warn!(
                fingerprint = %fingerprint,
                error = %err,
                "failed to remove gpg key from keychain"
            );
        }
    }
}
