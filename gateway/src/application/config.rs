//! Application-layer configuration: the shape a [`super::feed_gateway::FeedGateway`]
//! actually runs with, as opposed to `config::types::GatewayConfigFile`'s
//! on-disk JSON shape. Mirrors `agent/src/gateway_in/application/config.rs`'s
//! `GatewayConfig`/`MarketDataConfig` split.

/// Venue connection parameters. Base URLs are supplied by the caller —
/// sandbox vs. production selection is outside this crate (spec §9 Open
/// Question).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub venue_id: String,
    pub ws_url: String,
    pub rest_base_url: String,
}

/// Per-instrument conflation/recovery tuning: `update_cache_size` is
/// subscriber §4.5's `K`; `recovery_buffer_bound` caps how many live
/// messages a stalled recovery will buffer before dropping the oldest.
#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    pub update_cache_size: usize,
    pub recovery_buffer_bound: usize,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        MarketDataConfig {
            update_cache_size: 2,
            recovery_buffer_bound: 10_000,
        }
    }
}
