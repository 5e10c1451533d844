//! Configuration loader — YAML-based.
//!
//! Loads [`AppConfig`] from YAML configuration files. Application settings
//! live under the `settings:` key in `config/{env}.yaml`.
//!
//! Environment is resolved from `CGX_ENV` (default: `development`).

use std::env;
use std::path::{Path, PathBuf};

use cgx_domain::error::{Error, Result};
use tracing::info;

use crate::config::AppConfig;

/// Configuration loader service.
///
/// Reads YAML config files and extracts the `settings:` section as
/// [`AppConfig`].
#[derive(Clone, Default)]
pub struct ConfigLoader {
    /// Optional explicit config file path (overrides environment resolution)
    config_path: Option<PathBuf>,
    /// Optional base directory for `config/` resolution (defaults to cwd)
    base_dir: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit configuration file path (overrides env-based resolution).
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the directory whose `config/` subdirectory is searched.
    #[must_use]
    pub fn with_base_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Load configuration from YAML.
    ///
    /// Resolution order:
    /// 1. Explicit path (via `with_config_path`)
    /// 2. `config/{env}.local.yaml` (highest priority override)
    /// 3. `config/{env}.yaml` (standard config)
    ///
    /// # Errors
    ///
    /// Returns an error if no config file is found, parsing fails, or
    /// validation detects invalid values.
    pub fn load(&self) -> Result<AppConfig> {
        let yaml_path = self.find_yaml_config_path()?;
        info!(path = %yaml_path.display(), "Configuration loaded");

        let content = std::fs::read_to_string(&yaml_path)
            .map_err(|e| Error::io_with_source("Failed to read YAML config file", e))?;
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse YAML config: {e}")))?;

        let settings = yaml.get("settings").ok_or_else(|| {
            Error::ConfigMissing("No 'settings' key found in YAML configuration file".to_owned())
        })?;

        let app_config: AppConfig = serde_yaml::from_value(settings.clone())
            .map_err(|e| Error::config(format!("Failed to deserialize settings: {e}")))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Load configuration, falling back to defaults when no config file
    /// exists. Parse and validation failures still propagate.
    ///
    /// # Errors
    ///
    /// Returns an error when a config file exists but cannot be used.
    pub fn load_or_default(&self) -> Result<AppConfig> {
        match self.load() {
            Ok(config) => Ok(config),
            Err(Error::NotFound { .. }) => {
                info!("No configuration file found; using defaults");
                Ok(AppConfig::default())
            }
            Err(other) => Err(other),
        }
    }

    fn environment() -> String {
        env::var("CGX_ENV").unwrap_or_else(|_| "development".to_owned())
    }

    fn find_yaml_config_path(&self) -> Result<PathBuf> {
        if let Some(explicit) = &self.config_path {
            if explicit.exists() {
                return Ok(explicit.clone());
            }
            return Err(Error::not_found(format!(
                "config file {}",
                explicit.display()
            )));
        }

        let environment = Self::environment();
        let base = self
            .base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let candidates = [
            base.join("config").join(format!("{environment}.local.yaml")),
            base.join("config").join(format!("{environment}.yaml")),
        ];
        for candidate in &candidates {
            if candidate.exists() {
                return Ok(candidate.clone());
            }
        }
        Err(Error::not_found(format!(
            "config/{environment}.yaml (or .local.yaml)"
        )))
    }
}
