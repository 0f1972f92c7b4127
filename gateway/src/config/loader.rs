use std::path::Path;
use thiserror::Error;

use super::types::GatewayConfigFile;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config lists no instruments")]
    NoInstruments,
}

/// Loads gateway configuration from a JSON file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GatewayConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Loads configuration from a JSON string, validating it before returning.
pub fn load_config_from_str(json: &str) -> Result<GatewayConfigFile, ConfigError> {
    let config: GatewayConfigFile = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Loads the default embedded configuration (GDAX BTC-USD), used by the
/// recorder binary and by tests that need a ready-to-go config.
pub fn load_default_config() -> Result<GatewayConfigFile, ConfigError> {
    load_config_from_str(include_str!("gateway_config.json"))
}
