//! Filesystem configuration
//!
//! Settings are plain serde data with defaults for every field, so a JSON
//! file only needs to name what it changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Malformed config: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for a registry filesystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryFsConfig {
    /// Mount point of the native view; `32` and `64` suffixes select the
    /// other views
    pub mount_prefix: String,
    /// Filename under which a key's default value is listed
    pub default_value_token: String,
    /// Initial size and growth step of the buffer for live values
    pub live_buffer_step: usize,
    /// Owner reported when key metadata cannot be read
    pub unknown_uid: u32,
    /// Group reported when key metadata cannot be read
    pub unknown_gid: u32,
    /// Owner reported when the store has no security metadata
    pub default_uid: u32,
    /// Group reported when the store has no security metadata
    pub default_gid: u32,
}

impl Default for RegistryFsConfig {
    fn default() -> Self {
        Self {
            mount_prefix: "/proc/registry".to_string(),
            default_value_token: "@".to_string(),
            live_buffer_step: 1000,
            unknown_uid: 400,
            unknown_gid: 401,
            default_uid: 0,
            default_gid: 0,
        }
    }
}

impl RegistryFsConfig {
    /// Parses and validates a configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RegistryFsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that the settings can be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.mount_prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "mount prefix must be an absolute path without a trailing slash: {:?}",
                prefix
            )));
        }

        let token = &self.default_value_token;
        let reserved = token == "." || token == "..";
        if token.is_empty() || reserved || token.contains('/') || token.contains('%') {
            return Err(ConfigError::Invalid(format!(
                "default value token is not a usable filename: {:?}",
                token
            )));
        }

        if self.live_buffer_step == 0 {
            return Err(ConfigError::Invalid(
                "live buffer step must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
