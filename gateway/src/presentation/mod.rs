//! Presentation layer: outbound adapters from the gateway to downstream
//! consumers. Mirrors the inbound/outbound split in
//! `trading-infra/gateway/src/presentation/mod.rs` — infrastructure is
//! inbound (venue -> gateway), presentation is outbound (gateway ->
//! recorder/consumers).

mod recorder;

pub use recorder::{Recorder, RecorderError};
