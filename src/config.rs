//! Configuration management for the ledger node

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub miner: MinerConfig,
    pub node: NodeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_address: String,
    pub api_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Soft cap on proof candidates per block; `None` searches forever.
    pub max_iterations: Option<u64>,
    /// Pause between rounds of background mining.
    pub interval_ms: u64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            interval_ms: default_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Fixed reward recipient. A random one is generated when unset.
    pub identifier: Option<String>,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.network.api_port == 0 {
            return Err(ConfigError::Invalid(
                "network.api_port must be non-zero".to_string(),
            ));
        }

        if self.network.bind_address.is_empty() {
            return Err(ConfigError::Invalid(
                "network.bind_address must be set".to_string(),
            ));
        }

        if self.miner.max_iterations == Some(0) {
            return Err(ConfigError::Invalid(
                "miner.max_iterations must be positive when set".to_string(),
            ));
        }

        if matches!(&self.node.identifier, Some(id) if id.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "node.identifier cannot be blank".to_string(),
            ));
        }

        Ok(())
    }

    /// Applies the `PORT` environment variable, if it holds a valid port.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .filter(|p| *p != 0)
        {
            self.network.api_port = port;
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_interval_ms() -> u64 {
    100
}
