//! Configuration loading. Mirrors
//! `trading-infra/gateway/src/config/{mod,loader,types}.rs`: a JSON file
//! deserializes into `GatewayConfigFile`, which is then converted into the
//! application-layer `GatewayConfig`/`MarketDataConfig` pair the gateway
//! actually runs with.

pub mod loader;
pub mod types;

pub use loader::{ConfigError, load_config, load_config_from_str, load_default_config};
pub use types::{GatewayConfigFile, InstrumentConfig, MarketDataConfigJson};
