use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instrument::Instrument;
use crate::order_id::OrderId;
use crate::price::{Price, Quantity};
use crate::side::Side;

/// A single execution against the book. `aggressor_side` is the side of the
/// order that crossed the book (the taker); `maker_order_id`/`taker_order_id`
/// correlate the fill back to the resting and incoming orders when the venue
/// reports them (GDAX `match` messages carry both).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub instrument: Instrument,
    pub aggressor_side: Side,
    pub price: Price,
    pub qty: Quantity,
    pub sequence_id: u64,
    pub maker_order_id: Option<OrderId>,
    pub taker_order_id: Option<OrderId>,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instrument: Instrument,
        aggressor_side: Side,
        price: Price,
        qty: Quantity,
        sequence_id: u64,
        maker_order_id: Option<OrderId>,
        taker_order_id: Option<OrderId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Trade {
            instrument,
            aggressor_side,
            price,
            qty,
            sequence_id,
            maker_order_id,
            taker_order_id,
            timestamp,
        }
    }

    pub fn notional(&self) -> rust_decimal::Decimal {
        self.price.inner() * self.qty.inner()
    }
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}@{} seq={}",
            self.instrument, self.aggressor_side, self.qty, self.price, self.sequence_id
        )
    }
}
