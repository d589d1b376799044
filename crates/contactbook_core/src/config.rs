//! Contact book configuration.
//!
//! # Responsibility
//! - Describe where the store lives and how logging is set up.
//! - Load the description from a JSON file.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - Absent `database` means an in-memory store.

use crate::index::visibility::GroupVisibility;
use crate::logging::default_log_level;
use crate::model::group::GroupId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    /// SQLite file path; `None` opens an in-memory store.
    pub database: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
    /// Groups whose contacts are hidden from sectioned listings.
    pub hidden_groups: Vec<GroupId>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            database: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            hidden_groups: Vec::new(),
        }
    }
}

impl BookConfig {
    /// Config for an on-disk store with default logging.
    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        Self {
            database: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }

    pub fn visibility(&self) -> GroupVisibility {
        GroupVisibility::from_hidden(self.hidden_groups.iter().copied())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}
