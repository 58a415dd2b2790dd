//! Internal helper functions.

use std::io::Cursor;

use pgp::composed::{Deserializable, SignedPublicKey};
use pgp::types::KeyDetails;

use crate::error::{Error, Result};

/// Parse every public certificate in `data` (armored or binary).
///
/// Fails if the data cannot be read at all, holds no certificate, or if
/// any certificate in it is broken; a block is accepted or rejected as a
/// whole.
pub(crate) fn parse_public_keys(data: &[u8]) -> Result<Vec<SignedPublicKey>> {
    let cursor = Cursor::new(data);
    let (keys_iter, _headers) = SignedPublicKey::from_reader_many(cursor)
        .map_err(|e| Error::MalformedKey(e.to_string()))?;

    let mut keys = Vec::new();
    for key_result in keys_iter {
        let key = key_result.map_err(|e| Error::MalformedKey(e.to_string()))?;
        keys.push(key);
    }

    if keys.is_empty() {
        return Err(Error::MalformedKey("no public key found".to_string()));
    }

    Ok(keys)
}

/// Get the fingerprint as a hex string (uppercase, no spaces).
pub(crate) fn fingerprint_to_hex(key: &impl KeyDetails) -> String {
    hex::encode_upper(key.fingerprint().as_bytes())
}

/// User ID strings of a certificate, in packet order.
pub(crate) fn user_ids(key: &SignedPublicKey) -> Vec<String> {
    key.details
        .users
        .iter()
        .map(|u| String::from_utf8_lossy(u.id.id()).to_string())
        .collect()
}

/// Normalize a fingerprint for comparison (uppercase, no spaces).
#[cfg(feature = "keystore")]
pub(crate) fn normalize_fingerprint(fingerprint: &str) -> String {
    fingerprint.to_uppercase().replace(' ', "")
}
