//! Configuration loaded from a TOML file.
//!
//! ```toml
//! keychain_path = "/var/lib/app/keychain.db"
//! records_path = "/var/lib/app/gpg_keys.db"
//! busy_timeout_secs = 5
//! ```
//!
//! Missing paths mean in-memory databases.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[cfg(feature = "keystore")]
use crate::keystore::KeyStore;
#[cfg(feature = "keystore")]
use crate::records::RecordStore;

/// How long a store call waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage locations and the timeout applied to every store call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub keychain_path: Option<PathBuf>,
    pub records_path: Option<PathBuf>,
    /// Upper bound on how long a call waits for a locked database
    pub busy_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keychain_path: None,
            records_path: None,
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.busy_timeout_secs == 0 {
            return Err(Error::Config(
                "busy_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    /// Open the configured keychain.
    #[cfg(feature = "keystore")]
    pub fn open_keychain(&self) -> Result<KeyStore> {
        match &self.keychain_path {
            Some(path) => KeyStore::open_with_timeout(path, self.busy_timeout()),
            None => KeyStore::open_in_memory(),
        }
    }

    /// Open the configured record store.
    #[cfg(feature = "keystore")]
    pub fn open_records(&self) -> Result<RecordStore> {
        match &self.records_path {
            Some(path) => RecordStore::open_with_timeout(path, self.busy_timeout()),
            None => RecordStore::open_in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.busy_timeout(), DEFAULT_BUSY_TIMEOUT);
    }

    #[test]
    fn test_parse_paths() {
        let config = Config::from_toml_str(
            r#"
            keychain_path = "/tmp/keychain.db"
            busy_timeout_secs = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.keychain_path, Some(PathBuf::from("/tmp/keychain.db")));
        assert!(config.records_path.is_none());
        assert_eq!(config.busy_timeout_secs, 2);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = Config::from_toml_str("busy_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_toml_rejected() {
        let err = Config::from_toml_str("busy_timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/gpgkeychain.toml").unwrap_err();
        assert!(matches!(err, Error::Generic(_)));
    }

    #[cfg(feature = "keystore")]
    #[test]
    fn test_open_in_memory_stores() {
        let config = Config::default();
        assert!(config.open_keychain().unwrap().path().is_none());
        assert!(config.open_records().unwrap().path().is_none());
    }
}
