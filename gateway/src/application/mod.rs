//! Orchestration layer: sequencing, recovery, conflation, and process
//! lifecycle, built on the pure types from [`crate::domain`] and
//! [`convex_core`]. Mirrors `trading-infra/gateway/src/application/mod.rs`'s
//! split into one file per concern.

pub mod config;
pub mod feed_gateway;
pub mod instrument_handler;
pub mod recovery_handler;
pub mod subscriber;
pub mod supervisor;

pub use config::{GatewayConfig, MarketDataConfig};
pub use feed_gateway::{FeedGateway, UpdateCallback};
pub use instrument_handler::InstrumentHandler;
pub use recovery_handler::RecoveryHandler;
pub use subscriber::{Subscriber, SubscriberError};
pub use supervisor::Supervisor;
