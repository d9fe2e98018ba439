//! Per-mount state shared by every operation

use crate::config::RegistryFsConfig;
use registry_host::{names_match, RegistryHost, RegistryView};

/// The host, view and settings an operation runs against
#[derive(Clone, Copy)]
pub struct MountContext<'h> {
    pub host: &'h dyn RegistryHost,
    pub view: RegistryView,
    pub config: &'h RegistryFsConfig,
}

impl<'h> MountContext<'h> {
    pub fn new(
        host: &'h dyn RegistryHost,
        view: RegistryView,
        config: &'h RegistryFsConfig,
    ) -> Self {
        Self { host, view, config }
    }

    /// Maps a raw value name to the name listed for it
    ///
    /// The default value has an empty name and is listed under the token.
    pub fn listed_value_name<'a>(&'a self, raw: &'a str) -> &'a str {
        if raw.is_empty() {
            &self.config.default_value_token
        } else {
            raw
        }
    }

    /// Maps a looked-up name to the raw value name to query
    ///
    /// The token matches case-insensitively, like every other store name.
    pub fn queried_value_name<'a>(&self, name: &'a str) -> &'a str {
        if names_match(name, &self.config.default_value_token) {
            ""
        } else {
            name
        }
    }
}
