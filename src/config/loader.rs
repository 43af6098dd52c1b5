use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::ConfigError;

use super::container_config::{
    ContainerConfig, PartialConfigFile, PartialContainerConfig, ENV_CONTAINER_NAME,
    ENV_TRACK_STATS,
};

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader that only consults the environment
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Loader reading a TOML file before applying environment overrides
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn load_config(&self) -> Result<ContainerConfig, ConfigError> {
        let partial = match &self.path {
            Some(path) => self.load_partial_config(path)?,
            None => None,
        };
        let env_map = self.collect_env_vars();

        let config = ContainerConfig::from_partial_and_env(partial, &env_map)?;
        tracing::debug!(
            name = %config.name,
            track_stats = config.track_stats,
            "Container configuration loaded"
        );
        Ok(config)
    }

    fn load_partial_config(
        &self,
        path: &Path,
    ) -> Result<Option<PartialContainerConfig>, ConfigError> {
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(None);
        }

        let display = path.to_string_lossy().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(display.clone(), e))?;
        let file: PartialConfigFile =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParse(display, e))?;
        Ok(file.container)
    }

    fn collect_env_vars(&self) -> HashMap<String, String> {
        let env_keys = [ENV_CONTAINER_NAME, ENV_TRACK_STATS];

        let mut env_map = HashMap::new();
        for key in &env_keys {
            if let Ok(value) = env::var(key) {
                env_map.insert(key.to_string(), value);
            }
        }
        env_map
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
