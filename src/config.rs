//! Host configuration: search core settings plus gateway and rendering.
//!
//! Loaded from TOML. Every section and field is optional; anything missing
//! takes its default, so an empty file (or no file at all) is a valid
//! configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tgscout_search::SearchConfig;

use crate::error::{AppError, Result};

/// HTTP gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address.
    pub host: String,
    /// Bind port; `0` picks a free port. Overridden by `PORT`.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Message rendering limits of the delivery transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Hard cap on characters per message.
    pub max_message_chars: usize,
    /// Records per message before a new message is started.
    pub records_per_message: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 4_000,
            records_per_message: 10,
        }
    }
}

/// Complete host configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search core settings.
    pub search: SearchConfig,
    /// HTTP gateway.
    pub gateway: GatewayConfig,
    /// Message rendering.
    pub render: RenderConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `path` (or the default path), apply environment overrides
    /// and validate.
    ///
    /// An explicit `path` must exist. The default path may be missing, in
    /// which case defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the result
    /// is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Self::default_config_path();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    tracing::debug!(path = %default.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(std::env::var("PORT").ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the `PORT` override, if set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if `port` is not a valid port number.
    pub fn apply_env_overrides(&mut self, port: Option<&str>) -> Result<()> {
        if let Some(port) = port {
            self.gateway.port = port
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("invalid PORT {port:?}: {e}")))?;
        }
        Ok(())
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Search`] for an invalid search section, or
    /// [`AppError::Config`] for invalid render limits.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        if self.render.records_per_message == 0 {
            return Err(AppError::Config(
                "render.records_per_message must be greater than 0".into(),
            ));
        }
        if self.render.max_message_chars < 200 {
            return Err(AppError::Config(
                "render.max_message_chars must be at least 200".into(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path: `~/.config/tgscout/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("tgscout").join("config.toml")
        } else if let Some(config) = dirs::config_dir() {
            config.join("tgscout").join("config.toml")
        } else {
            PathBuf::from("/tmp/tgscout-config/config.toml")
        }
    }
}
