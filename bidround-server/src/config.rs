//! Server configuration
//!
//! Read from a TOML file. A missing file is not fatal: the server runs
//! with defaults and admin operations disabled. An unreadable or
//! unparsable file is an error.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] io::Error),

    #[error("parsing config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime settings of the bidround server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Bearer token for admin operations; absence disables them
    pub admin_token: Option<String>,
    /// Path of the event log file
    pub db_file: PathBuf,
    /// Lowest accepted offer in cents
    pub min_offer: i64,
    /// Sync the event log to disk after every append
    pub fsync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9600".to_string(),
            admin_token: None,
            db_file: PathBuf::from("db.jsonl"),
            min_offer: 0,
            fsync: false,
        }
    }
}

impl Config {
    /// Load the config from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(toml::from_str(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "Config: no file at {:?}, using defaults (admin operations disabled)",
                    path
                );
                Ok(Config::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}
