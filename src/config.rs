//! Configuration loaded from `rowmap.toml`.
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/app"
//! max_connections = 5
//! dialect = "numbered"   # optional, inferred from the url otherwise
//! ```
//!
//! `ROWMAP_DATABASE_URL` overrides `database.url`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{MapError, MapResult};

/// Config file looked up in the working directory, then the user config dir.
pub const CONFIG_FILE: &str = "rowmap.toml";

/// Environment variable overriding `database.url`.
pub const DATABASE_URL_ENV: &str = "ROWMAP_DATABASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    pub dialect: Option<Dialect>,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            dialect: None,
        }
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> MapResult<Self> {
        toml::from_str(content).map_err(|e| MapError::Config(format!("{}: {}", CONFIG_FILE, e)))
    }

    /// Read and parse a config file.
    pub fn from_file(path: impl AsRef<Path>) -> MapResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load the first config file found, or the defaults, then apply the
    /// environment override.
    pub fn load() -> MapResult<Self> {
        let config = match Self::locate() {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_url_override(std::env::var(DATABASE_URL_ENV).ok()))
    }

    fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        let global = dirs::config_dir()?.join("rowmap").join(CONFIG_FILE);
        global.exists().then_some(global)
    }

    /// Replace the database url when `url` is set.
    pub fn with_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.database.url = Some(url);
        }
        self
    }

    pub fn url(&self) -> MapResult<&str> {
        self.database.url.as_deref().ok_or_else(|| {
            MapError::Config(format!(
                "no database.url in {} and {} is not set",
                CONFIG_FILE, DATABASE_URL_ENV
            ))
        })
    }

    /// The configured dialect, or the one implied by the url scheme.
    pub fn dialect(&self) -> MapResult<Dialect> {
        if let Some(dialect) = self.database.dialect {
            return Ok(dialect);
        }
        let url = self.url()?;
        Dialect::for_url(url).ok_or_else(|| {
            MapError::Config(format!("cannot infer dialect from url '{}'", url))
        })
    }
}
