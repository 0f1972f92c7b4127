//! Sequenced market-data gateway for a single cryptocurrency venue.
//!
//! Layout follows `trading-infra/gateway`'s hexagonal split:
//! - [`domain`] — wire vocabulary and ports (`VenueEvent`, `SnapshotFetcher`),
//!   no I/O.
//! - [`application`] — sequencing, recovery, conflation, process lifecycle
//!   (`InstrumentHandler`, `RecoveryHandler`, `FeedGateway`, `Subscriber`,
//!   `Supervisor`), driven entirely through the domain ports.
//! - [`infrastructure`] — inbound adapters: the venue WebSocket client and
//!   REST snapshot fetcher.
//! - [`presentation`] — outbound adapters: the NDJSON recorder.
//! - [`config`] — on-disk JSON configuration, loaded into the application
//!   layer's config types.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::{
    FeedGateway, GatewayConfig, InstrumentHandler, MarketDataConfig, RecoveryHandler, Subscriber,
    SubscriberError, Supervisor, UpdateCallback,
};
pub use domain::{ParseError, SubscribeRequest, VenueEvent};
pub use infrastructure::{RestClient, RestError, WsClient, WsError, WsEvent, WsHandle};
pub use presentation::{Recorder, RecorderError};
