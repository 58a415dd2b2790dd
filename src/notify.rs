//! Owner notification after a key is committed.
//!
//! A successful creation does not notify anyone by itself. It hands back a
//! [`PendingNotification`], and whoever owns the transaction dispatches it
//! once the record is durably committed. Dispatching consumes the token, so
//! a notification fires at most once; dropping it (for example because the
//! commit failed) means it never fires.

use tracing::info;

use crate::types::GpgKeyRecord;

/// Delivers "new GPG key" notifications to key owners.
///
/// Delivery is fire-and-forget: failures are the notifier's concern and are
/// never reported back to the lifecycle.
pub trait Notifier {
    fn new_gpg_key(&self, record: &GpgKeyRecord);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn new_gpg_key(&self, record: &GpgKeyRecord) {
        (**self).new_gpg_key(record)
    }
}

/// A notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn new_gpg_key(&self, record: &GpgKeyRecord) {
        info!(
            owner = record.owner_id,
            fingerprint = %record.fingerprint,
            "new gpg key added to account"
        );
    }
}

/// A notification waiting for its transaction to commit.
#[derive(Debug)]
#[must_use = "a pending notification only fires when dispatched after commit"]
pub struct PendingNotification {
    record: GpgKeyRecord,
}

impl PendingNotification {
    pub(crate) fn new(record: GpgKeyRecord) -> Self {
        Self { record }
    }

    /// The record the notification is about.
    pub fn record(&self) -> &GpgKeyRecord {
        &self.record
    }

    /// Deliver the notification. Call only after the commit succeeded.
    pub fn dispatch<N: Notifier + ?Sized>(self, notifier: &N) {
        notifier.new_gpg_key(&self.record);
    }
}
