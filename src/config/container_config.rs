use serde::Deserialize;
use std::collections::HashMap;

use crate::errors::ConfigError;

pub const ENV_CONTAINER_NAME: &str = "INJEKT_CONTAINER_NAME";
pub const ENV_TRACK_STATS: &str = "INJEKT_TRACK_STATS";

/// Container configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Name used in log records and error context
    pub name: String,
    /// Whether resolution statistics are recorded
    pub track_stats: bool,
}

/// Partial container configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialContainerConfig {
    pub name: Option<String>,
    pub track_stats: Option<bool>,
}

/// Root of a TOML file carrying a `[container]` table
#[derive(Deserialize, Debug, Default)]
pub struct PartialConfigFile {
    pub container: Option<PartialContainerConfig>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            track_stats: default_track_stats(),
        }
    }
}

impl ContainerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create ContainerConfig from partial config with defaults
    pub fn from_partial(partial: Option<PartialContainerConfig>) -> Self {
        let partial = partial.unwrap_or_default();

        Self {
            name: partial.name.unwrap_or_else(default_name),
            track_stats: partial.track_stats.unwrap_or_else(default_track_stats),
        }
    }

    /// Environment values take precedence over the file
    pub fn from_partial_and_env(
        partial: Option<PartialContainerConfig>,
        env_map: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::from_partial(partial);

        if let Some(name) = env_map.get(ENV_CONTAINER_NAME) {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: ENV_CONTAINER_NAME.to_string(),
                    value: name.clone(),
                });
            }
            config.name = name.trim().to_string();
        }

        if let Some(value) = env_map.get(ENV_TRACK_STATS) {
            config.track_stats = parse_bool(ENV_TRACK_STATS, value)?;
        }

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: PartialConfigFile = toml::from_str(content)
            .map_err(|e| ConfigError::TomlParse("<inline>".to_string(), e))?;
        Ok(Self::from_partial(file.container))
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn default_name() -> String {
    "default".to_string()
}

fn default_track_stats() -> bool {
    true
}
