//! Declared configuration for a rotation set.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::{Path, PathBuf};

use multirotate_reconciler::{DeclaredConfig, Field, DEFAULT_COUNT, MAX_COUNT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] multirotate_core::Error),
}

/// Configuration of one rotation set, as written in TOML.
///
/// ```toml
/// rotation_period = "720h"
/// count = 3
/// version = "v2"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetConfig {
    /// Rotation period, e.g. `"1h30m"`.
    pub rotation_period: String,

    /// Number of slots.
    #[serde(default = "default_count")]
    pub count: i64,

    /// Version tag for future rotations.
    #[serde(default)]
    pub version: String,

    /// Evaluation instant. Left undetermined when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
}

impl SetConfig {
    /// Create a config with the given period and defaults elsewhere.
    #[must_use]
    pub fn new(rotation_period: impl Into<String>) -> Self {
        Self {
            rotation_period: rotation_period.into(),
            count: default_count(),
            version: String::new(),
            now: None,
        }
    }

    /// Parse TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Parse` if it is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Override the evaluation instant.
    #[must_use]
    pub fn with_now(mut self, now: Option<String>) -> Self {
        if now.is_some() {
            self.now = now;
        }
        self
    }

    /// Override the version tag.
    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        if let Some(version) = version {
            self.version = version;
        }
        self
    }

    /// Convert to the reconciler's declared input.
    ///
    /// Only the count is converted here. Period and instant text pass through
    /// unparsed; the reconciler checks them after comparing the count against
    /// any committed state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCount` if `count` is below 1 or above `MAX_COUNT`.
    pub fn to_declared(&self) -> multirotate_core::Result<DeclaredConfig> {
        Ok(DeclaredConfig {
            rotation_period: Field::Known(self.rotation_period.clone()),
            count: Field::Known(self.slot_count()?),
            version: Field::Known(self.version.clone()),
            now: self.now.clone().into(),
        })
    }

    fn slot_count(&self) -> multirotate_core::Result<usize> {
        usize::try_from(self.count)
            .ok()
            .filter(|count| (1..=MAX_COUNT).contains(count))
            .ok_or_else(|| multirotate_core::Error::invalid_count(self.count))
    }
}

fn default_count() -> i64 {
    i64::try_from(DEFAULT_COUNT).unwrap_or(2)
}
