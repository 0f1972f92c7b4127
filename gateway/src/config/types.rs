use serde::{Deserialize, Serialize};

use super::loader::ConfigError;
use crate::application::config::{GatewayConfig, MarketDataConfig};

/// Root configuration for a single venue gateway, following
/// `agent/src/gateway_in/config/types.rs`'s `GatewayConfigFile` shape,
/// specialized from "one config file, many exchanges" down to "one config
/// file, one venue, many instruments" — this crate's gateway serves one
/// venue (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigFile {
    pub venue_id: String,
    pub ws_url: String,
    pub rest_base_url: String,
    pub instruments: Vec<InstrumentConfig>,
    #[serde(default)]
    pub market_data: MarketDataConfigJson,
}

/// One instrument to subscribe to: `(base, quote)`, venue id comes from the
/// enclosing [`GatewayConfigFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub base_currency: String,
    pub quote_currency: String,
}

/// Per-instrument conflation/recovery tuning (JSON representation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfigJson {
    #[serde(default = "default_update_cache_size")]
    pub update_cache_size: usize,
    #[serde(default = "default_recovery_buffer_bound")]
    pub recovery_buffer_bound: usize,
}

impl Default for MarketDataConfigJson {
    fn default() -> Self {
        MarketDataConfigJson {
            update_cache_size: default_update_cache_size(),
            recovery_buffer_bound: default_recovery_buffer_bound(),
        }
    }
}

fn default_update_cache_size() -> usize {
    2
}

fn default_recovery_buffer_bound() -> usize {
    10_000
}

impl GatewayConfigFile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        Ok(())
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            venue_id: self.venue_id.clone(),
            ws_url: self.ws_url.clone(),
            rest_base_url: self.rest_base_url.clone(),
        }
    }

    pub fn market_data_config(&self) -> MarketDataConfig {
        MarketDataConfig {
            update_cache_size: self.market_data.update_cache_size,
            recovery_buffer_bound: self.market_data.recovery_buffer_bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_config() {
        let json = r#"{
            "venue_id": "GDAX",
            "ws_url": "wss://ws-feed.gdax.com",
            "rest_base_url": "https://api.gdax.com",
            "instruments": [{"base_currency": "BTC", "quote_currency": "USD"}]
        }"#;
        let config: GatewayConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(config.instruments.len(), 1);
        assert_eq!(config.market_data.update_cache_size, 2);
        assert_eq!(config.market_data.recovery_buffer_bound, 10_000);
    }

    #[test]
    fn rejects_empty_instrument_list() {
        let config = GatewayConfigFile {
            venue_id: "GDAX".into(),
            ws_url: "wss://x".into(),
            rest_base_url: "https://x".into(),
            instruments: vec![],
            market_data: MarketDataConfigJson::default(),
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoInstruments)));
    }
}
