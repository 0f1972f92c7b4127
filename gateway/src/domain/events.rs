//! The venue's WebSocket event vocabulary (spec §6), modeled as a tagged
//! variant rather than the dynamically-typed `{'open': fn, ...}` dispatch
//! table the system this was distilled from used. Parse-then-dispatch on
//! the variant; an unrecognized `type` fails deserialization and the caller
//! turns that into a [`crate::domain::errors::ParseError`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VenueEvent {
    Received {
        product_id: String,
        sequence: u64,
        #[allow(dead_code)]
        time: String,
    },
    Open {
        product_id: String,
        sequence: u64,
        time: String,
        order_id: String,
        side: String,
        price: String,
        remaining_size: String,
    },
    Match {
        product_id: String,
        sequence: u64,
        time: String,
        maker_order_id: String,
        #[serde(default)]
        taker_order_id: Option<String>,
        side: String,
        price: String,
        size: String,
    },
    Done {
        product_id: String,
        sequence: u64,
        time: String,
        order_id: String,
        side: String,
        #[serde(default)]
        price: Option<String>,
    },
    Change {
        product_id: String,
        sequence: u64,
        time: String,
        order_id: String,
        side: String,
        #[serde(default)]
        price: Option<String>,
        #[serde(default)]
        new_size: Option<String>,
        #[serde(default)]
        new_funds: Option<String>,
    },
}

impl VenueEvent {
    pub fn sequence(&self) -> u64 {
        match self {
            VenueEvent::Received { sequence, .. }
            | VenueEvent::Open { sequence, .. }
            | VenueEvent::Match { sequence, .. }
            | VenueEvent::Done { sequence, .. }
            | VenueEvent::Change { sequence, .. } => *sequence,
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            VenueEvent::Received { product_id, .. }
            | VenueEvent::Open { product_id, .. }
            | VenueEvent::Match { product_id, .. }
            | VenueEvent::Done { product_id, .. }
            | VenueEvent::Change { product_id, .. } => product_id,
        }
    }

    pub fn time(&self) -> Option<&str> {
        match self {
            VenueEvent::Received { time, .. }
            | VenueEvent::Open { time, .. }
            | VenueEvent::Match { time, .. }
            | VenueEvent::Done { time, .. }
            | VenueEvent::Change { time, .. } => Some(time),
        }
    }
}

/// Outbound subscribe request (spec §6): `{"type":"subscribe","product_id":"BTC-USD"}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub product_id: String,
}

impl SubscribeRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        SubscribeRequest {
            kind: "subscribe",
            product_id: product_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_event() {
        let raw = r#"{"type":"open","product_id":"BTC-USD","sequence":10,"time":"2026-01-01T00:00:00Z","order_id":"A","side":"buy","price":"100.00","remaining_size":"1.5"}"#;
        let event: VenueEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.sequence(), 10);
        assert_eq!(event.product_id(), "BTC-USD");
        assert!(matches!(event, VenueEvent::Open { .. }));
    }

    #[test]
    fn parses_done_without_price_as_market_order() {
        let raw = r#"{"type":"done","product_id":"BTC-USD","sequence":12,"time":"2026-01-01T00:00:00Z","order_id":"A","side":"buy"}"#;
        let event: VenueEvent = serde_json::from_str(raw).unwrap();
        match event {
            VenueEvent::Done { price, .. } => assert!(price.is_none()),
            _ => panic!("expected Done"),
        }
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let raw = r#"{"type":"heartbeat","product_id":"BTC-USD","sequence":1,"time":"x"}"#;
        let result: Result<VenueEvent, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn subscribe_request_serializes_product_id() {
        let req = SubscribeRequest::new("BTC-USD");
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"type\":\"subscribe\""));
        assert!(json.contains("BTC-USD"));
    }
}
