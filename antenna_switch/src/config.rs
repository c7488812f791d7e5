use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{controllers::switchboard::port_map::PortMap, models::Port};

pub const DEFAULT_CONFIG_PATH: &str = "~/.antenna-switch.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found at {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration file: {source}")]
    ReadError { source: std::io::Error },

    #[error("Failed to parse configuration: {source}")]
    ParseError { source: serde_json::Error },

    #[error("Failed to serialize configuration: {source}")]
    SerializeError { source: serde_json::Error },

    #[error("Failed to write configuration file: {source}")]
    WriteError { source: std::io::Error },

    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    pub listen_address: String,
    pub ports: Vec<Port>,
    /// Empty means look `ticcmd` up on `PATH`.
    #[serde(default)]
    pub ticcmd_path: String,
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8123".to_string(),
            ports: vec![
                Port::new("40M", 32),
                Port::new("20M", 16),
                Port::new("Ground", 0),
                Port::new("Aux 1", -16),
                Port::new("Aux 2", -32),
            ],
            ticcmd_path: String::new(),
            debug: false,
        }
    }
}

impl Config {
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_address
            .parse()
            .map_err(|e| ConfigError::ValidationError {
                message: format!("invalid listen address {:?}: {e}", self.listen_address),
            })
    }

    pub fn port_map(&self) -> Result<PortMap, ConfigError> {
        PortMap::new(self.ports.clone()).map_err(|e| ConfigError::ValidationError {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        self.port_map()?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct ConfigOptions {
    pub config_path: PathBuf,
    pub create_if_missing: bool,
}

impl ConfigOptions {
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
            create_if_missing: true,
        }
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    options: ConfigOptions,
}

impl ConfigManager {
    pub fn with_options(options: ConfigOptions) -> Self {
        Self { options }
    }

    pub fn load(&self) -> anyhow::Result<Config> {
        let config_path = &self.options.config_path;

        if !config_path.exists() {
            if !self.options.create_if_missing {
                return Err(ConfigError::FileNotFound {
                    path: config_path.clone(),
                }
                .into());
            }

            info!(path = %config_path.display(), "writing default configuration");
            let default_config = Config::default();
            self.save(&default_config)
                .context("Failed to save default config")?;
            return Ok(default_config);
        }

        let content =
            fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError { source: e })?;

        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError { source: e })?;
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, config: &Config) -> anyhow::Result<()> {
        let config_path = &self.options.config_path;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError { source: e })?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(config_path, content).map_err(|e| ConfigError::WriteError { source: e })?;

        Ok(())
    }
}

pub fn init_config_with_options(options: ConfigOptions) -> anyhow::Result<(ConfigManager, Config)> {
    let manager = ConfigManager::with_options(options);
    let config = manager.load()?;
    Ok((manager, config))
}
