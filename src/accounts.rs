//! Read-only access to account emails.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::OwnerId;

/// Looks up the registered email of the account that owns a key.
pub trait AccountDirectory {
    /// Fails with [`Error::UnknownOwner`] if the account does not exist.
    fn registered_email(&self, owner_id: OwnerId) -> Result<String>;
}

impl AccountDirectory for HashMap<OwnerId, String> {
    fn registered_email(&self, owner_id: OwnerId) -> Result<String> {
        self.get(&owner_id)
            .cloned()
            .ok_or(Error::UnknownOwner(owner_id))
    }
}

impl<A: AccountDirectory + ?Sized> AccountDirectory for &A {
    fn registered_email(&self, owner_id: OwnerId) -> Result<String> {
        (**self).registered_email(owner_id)
    }
}
