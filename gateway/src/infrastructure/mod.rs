//! Infrastructure layer: inbound adapters to the venue (WebSocket feed,
//! REST snapshot fetcher). Mirrors the split in
//! `trading-infra/gateway/src/infrastructure/{ws_client,rest_client}.rs` —
//! infrastructure is inbound (venue → gateway); `presentation` is outbound
//! (gateway → recorder/consumers).

pub mod rest_client;
pub mod ws_client;

pub use rest_client::{RestClient, RestError};
pub use ws_client::{WsClient, WsError, WsEvent, WsHandle};
