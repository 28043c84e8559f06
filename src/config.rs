//! # Configuration
//!
//! Run settings read from a TOML file. Every section and key is optional; missing values
//! fall back to [`Default`]. The binary overrides file values with its command-line flags.
//!
//! ```toml
//! [archive]
//! base_url = "https://cddis.nasa.gov/archive/gnss/products"
//! auth_host = "urs.earthdata.nasa.gov"
//! username = "someone"
//! password = "secret"
//! attempts = 3
//! retry_delay_secs = 2
//! download_dir = "downloads"
//!
//! [store]
//! dir = "store"
//!
//! [listing]
//! file = "stations.txt"
//! ```
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::{
    constants::{DEFAULT_AUTH_HOST, DEFAULT_PRODUCTS_URL},
    snxroster_errors::SnxRosterError,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub archive: ArchiveConfig,
    pub store: StoreConfig,
    pub listing: ListingConfig,
}

/// Retrieval of the solution file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub base_url: String,
    /// Host allowed to receive the credentials across redirects
    pub auth_host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Download attempts before giving up (at least one is made)
    pub attempts: u32,
    /// Delay before the first retry, doubled on each further retry
    pub retry_delay_secs: u64,
    pub download_dir: Utf8PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            base_url: DEFAULT_PRODUCTS_URL.to_string(),
            auth_host: DEFAULT_AUTH_HOST.to_string(),
            username: None,
            password: None,
            attempts: 3,
            retry_delay_secs: 2,
            download_dir: Utf8PathBuf::from("downloads"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub dir: Utf8PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            dir: Utf8PathBuf::from("store"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Saved listing of the daily observation directory
    pub file: Option<Utf8PathBuf>,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, SnxRosterError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Utf8Path) -> Result<Self, SnxRosterError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod config_test {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.archive.base_url, DEFAULT_PRODUCTS_URL);
        assert_eq!(config.archive.attempts, 3);
        assert_eq!(config.store.dir, "store");
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml_str(
            r#"
            [archive]
            username = "someone"
            attempts = 5

            [listing]
            file = "daily.txt"
            "#,
        )
        .unwrap();
        assert_eq!(config.archive.username.as_deref(), Some("someone"));
        assert_eq!(config.archive.attempts, 5);
        assert_eq!(config.archive.auth_host, DEFAULT_AUTH_HOST);
        assert_eq!(config.listing.file, Some(Utf8PathBuf::from("daily.txt")));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::from_toml_str("[archive]\nattempts = \"three\""),
            Err(SnxRosterError::ConfigError(_))
        ));
    }
}
