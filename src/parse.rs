//! Key parsing functions.
//!
//! This module reads armored public key blocks and extracts the two things
//! the rest of the crate cares about: primary key fingerprints and the
//! email identities claimed by the user ID packets.

use tracing::debug;

use crate::error::Result;
use crate::internal::{fingerprint_to_hex, parse_public_keys, user_ids};
use crate::types::ParsedKey;

/// Parse an armored key block and extract fingerprints and emails.
///
/// # Arguments
/// * `armored_key` - ASCII-armored public key block
///
/// # Returns
/// One fingerprint per certificate in the block and the emails of all
/// their user IDs. Identical input always yields identical output.
///
/// # Example
/// ```ignore
/// let parsed = parse_key(&std::fs::read_to_string("alice.asc")?)?;
/// println!("{:?} {:?}", parsed.fingerprints, parsed.emails);
/// ```
pub fn parse_key(armored_key: &str) -> Result<ParsedKey> {
    let keys = parse_public_keys(armored_key.as_bytes())?;

    let fingerprints = keys
        .iter()
        .map(|key| fingerprint_to_hex(&key.primary_key))
        .collect();

    let mut emails: Vec<String> = Vec::new();
    for uid in keys.iter().flat_map(user_ids) {
        match extract_email(&uid) {
            Some(email) if !emails.contains(&email) => emails.push(email),
            Some(_) => {}
            None => debug!(uid = %uid, "user ID carries no email"),
        }
    }

    Ok(ParsedKey {
        fingerprints,
        emails,
    })
}

/// Extract the primary key fingerprints from an armored key block.
///
/// A well-formed block normally holds exactly one certificate, but this
/// function reports whatever the block contains; deciding whether that
/// is acceptable is up to the caller.
pub fn parse_fingerprints(armored_key: &str) -> Result<Vec<String>> {
    Ok(parse_key(armored_key)?.fingerprints)
}

/// Extract every email identity embedded in an armored key block.
///
/// Emails are returned in the order their user IDs appear. A key without
/// any email identity yields an empty list.
pub fn parse_emails(armored_key: &str) -> Result<Vec<String>> {
    Ok(parse_key(armored_key)?.emails)
}

/// Extract email from a User ID string (e.g., "Name <email@example.com>").
pub fn extract_email(uid: &str) -> Option<String> {
    if let Some(start) = uid.find('<') {
        if let Some(end) = uid.rfind('>') {
            if start < end {
                let email = uid[start + 1..end].trim();
                if !email.is_empty() {
                    return Some(email.to_string());
                }
            }
        }
    }
    // Check if the whole thing is an email
    let uid = uid.trim();
    if uid.contains('@') && !uid.contains(' ') {
        return Some(uid.to_string());
    }
    None
}
