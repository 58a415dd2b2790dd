//! Internal helper functions and utilities.
//!
//! This module contains shared implementation details that are not part
//! of the public API.

mod helpers;
#[cfg(feature = "keystore")]
mod schema;

pub(crate) use helpers::*;
#[cfg(feature = "keystore")]
pub(crate) use schema::{init_versioned_schema, Migration};
