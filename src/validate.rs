//! Key record validation.
//!
//! Pure checks run before a key is persisted. None of these functions
//! write anything; the uniqueness check only reads from the store.

use tracing::debug;

use crate::error::{Error, Result, KEY_PREFIX};
use crate::parse::parse_fingerprints;
use crate::records::GpgKeyStore;

/// Normalizes submitted key text before it is validated or stored.
///
/// Leading and trailing whitespace is dropped so that the same key pasted
/// with or without a trailing newline is treated as the same key.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_string()
}

/// Validates that the key text is a single armored public key block.
///
/// Accepted format:
/// - Begins with `-----BEGIN PGP PUBLIC KEY BLOCK-----`
/// - Has content after the marker
/// - Contains no second occurrence of the marker
pub fn validate_format(key: &str) -> Result<()> {
    let Some(body) = key.strip_prefix(KEY_PREFIX) else {
        debug!("key does not start with the public key marker");
        return Err(Error::invalid_format());
    };

    if body.is_empty() {
        debug!("key has nothing after the public key marker");
        return Err(Error::invalid_format());
    }

    if body.contains(KEY_PREFIX) {
        debug!("key contains more than one public key block");
        return Err(Error::invalid_format());
    }

    Ok(())
}

/// Derives the fingerprint of a key that passed [`validate_format`].
///
/// The block must contain exactly one certificate. A block that parses
/// to several certificates is rejected rather than reduced to its first
/// fingerprint.
pub fn derive_fingerprint(key: &str) -> Result<String> {
    single_fingerprint(parse_fingerprints(key)?)
}

/// Reduce parsed fingerprints to the one a key record may carry.
pub(crate) fn single_fingerprint(mut fingerprints: Vec<String>) -> Result<String> {
    match fingerprints.len() {
        1 => Ok(fingerprints.remove(0)),
        0 => Err(Error::MalformedKey("key has no fingerprint".to_string())),
        n => Err(Error::MalformedKey(format!(
            "expected exactly one public key, found {}",
            n
        ))),
    }
}

/// Checks that neither the key text nor its fingerprint is registered yet.
///
/// The key text is checked first, so resubmitting an identical key reports
/// [`Error::DuplicateKey`] rather than a fingerprint clash.
pub fn validate_uniqueness<S>(key: &str, fingerprint: &str, store: &S) -> Result<()>
where
    S: GpgKeyStore + ?Sized,
{
    if store.find_by_armored_key(key)?.is_some() {
        return Err(Error::DuplicateKey);
    }

    if store.find_by_fingerprint(fingerprint)?.is_some() {
        return Err(Error::DuplicateFingerprint(fingerprint.to_string()));
    }

    Ok(())
}
