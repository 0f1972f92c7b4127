//! Integration test: registering a [`Subscriber`] against a [`FeedGateway`]
//! allocates the instrument's runtime and wires the callback without
//! requiring a live venue connection; no update is observed until the
//! gateway actually publishes one.

use std::sync::Arc;

use async_trait::async_trait;
use convex_gateway::application::config::{GatewayConfig, MarketDataConfig};
use convex_gateway::domain::traits::{FetchError, RawSnapshot, SnapshotFetcher};
use convex_gateway::{FeedGateway, Subscriber};

struct EmptyFetcher;

#[async_trait]
impl SnapshotFetcher for EmptyFetcher {
    async fn fetch_snapshot(&self, _product_id: &str) -> Result<RawSnapshot, FetchError> {
        Ok(RawSnapshot {
            sequence: 0,
            bids: vec![],
            asks: vec![],
        })
    }
}

#[tokio::test]
async fn register_wires_subscriber_with_no_data_before_first_publish() {
    let instrument = convex_core::Instrument::new("BTC", "USD", "GDAX");
    let gateway = FeedGateway::new(
        GatewayConfig {
            venue_id: "GDAX".into(),
            ws_url: "wss://unused".into(),
            rest_base_url: "https://unused".into(),
        },
        MarketDataConfig::default(),
        Arc::new(EmptyFetcher),
    );

    let subscriber = Arc::new(Subscriber::new(2));
    gateway.register(instrument.clone(), subscriber.clone());

    assert!(subscriber.fetch_nowait().is_err());
}
