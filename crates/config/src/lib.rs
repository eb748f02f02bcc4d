//! Layered configuration for the dusk catalog store.
//!
//! Sources are merged in order, later sources winning:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A TOML file: either an explicit path, or `config.toml` inside the
//!    platform configuration directory if one exists.
//! 3. Environment variables prefixed with `DUSK_`, nested keys separated by
//!    a double underscore (`DUSK_DATABASE__MAX_CONNECTIONS=3`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "DUSK_";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "library.db";

/// Largest page a listing may request.
pub const MAX_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file. Created if missing.
    pub path: PathBuf,
    pub max_connections: u32,
    /// How long a writer waits on a locked database before giving up.
    pub busy_timeout_ms: u64,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE));
        Self {
            path,
            max_connections: 5,
            busy_timeout_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when a caller does not ask for one.
    pub default_limit: u32,
}
impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "dusk")
}

impl Config {
    /// Load configuration from defaults, a config file and the environment.
    ///
    /// An explicit `file` must exist. Without one, the platform default
    /// location is used only if present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::FileNotFound(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            },
            None => {
                if let Some(path) = project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
                    && path.is_file()
                {
                    tracing::debug!(path = %path.display(), "Using default config file");
                    figment = figment.merge(Toml::file(path));
                }
            },
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration from an already assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "database.max_connections",
                reason: "must be > 0"
            });
        }
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "database.path",
                reason: "value is missing"
            });
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&self.pagination.default_limit) {
            exn::bail!(ErrorKind::Invalid {
                field: "pagination.default_limit",
                reason: "must be between 1 and 1000"
            });
        }
        Ok(())
    }
}
