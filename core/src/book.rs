//! The order-based limit order book: orders are tracked individually by
//! order id rather than aggregated into price levels up front. Levels are
//! derived views, built lazily as orders arrive at a price — mirrors
//! `market_data/order_based_book.py` in the system this was distilled from,
//! which keeps one `SortedDict` per side and a small per-price dict of
//! `order_id -> qty`.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::instrument::Instrument;
use crate::order_id::OrderId;
use crate::price::{Price, Quantity};
use crate::side::Side;

/// The resting orders at a single price, in arrival order. `IndexMap`
/// preserves insertion order so level iteration reflects time priority
/// without a separate queue; a `change_order` updates a value in place and
/// never re-pegs it to the back (spec's queue-position invariant, S6).
#[derive(Debug, Clone)]
struct OrderBasedLevel {
    price: Price,
    orders: IndexMap<OrderId, Quantity>,
}

impl OrderBasedLevel {
    fn new(price: Price) -> Self {
        OrderBasedLevel {
            price,
            orders: IndexMap::new(),
        }
    }

    fn qty(&self) -> Quantity {
        self.orders
            .values()
            .copied()
            .fold(Quantity::ZERO, |acc, q| acc + q)
    }

    fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// An aggregated, immutable view of a single price in a [`BookSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: Price,
    pub qty: Quantity,
    pub order_count: usize,
}

impl From<&OrderBasedLevel> for Level {
    fn from(level: &OrderBasedLevel) -> Self {
        Level {
            price: level.price,
            qty: level.qty(),
            order_count: level.order_count(),
        }
    }
}

/// A point-in-time, read-only view of both sides of the book, ordered best
/// price first (bids descending, asks ascending). Produced by
/// [`OrderBasedBook::snapshot`] and carried on [`crate::update::Update`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub instrument: Instrument,
    pub sequence_id: u64,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
}

impl BookSnapshot {
    /// Best `n` levels per side. `n = 0` returns the full book.
    pub fn top(&self, n: usize) -> (&[Level], &[Level]) {
        let bids = if n == 0 {
            &self.bids[..]
        } else {
            &self.bids[..n.min(self.bids.len())]
        };
        let asks = if n == 0 {
            &self.asks[..]
        } else {
            &self.asks[..n.min(self.asks.len())]
        };
        (bids, asks)
    }

    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }

    pub fn mid(&self) -> Option<rust_decimal::Decimal> {
        let bid = self.best_bid()?.price.inner();
        let ask = self.best_ask()?.price.inner();
        Some((bid + ask) / rust_decimal::Decimal::TWO)
    }
}

impl fmt::Display for BookSnapshot {
    /// Prints up to 5 levels per side, best first, matching the depth most
    /// of the original's debugging dumps used.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (seq={})", self.instrument, self.sequence_id)?;
        let (bids, asks) = self.top(5);
        for ask in asks.iter().rev() {
            writeln!(f, "  ASK {} x {}", ask.price, ask.qty)?;
        }
        for bid in bids {
            writeln!(f, "  BID {} x {}", bid.price, bid.qty)?;
        }
        Ok(())
    }
}

/// Reverse-ordered key so bids iterate best (highest) price first out of a
/// `BTreeMap`, which is naturally ascending. `std::cmp::Reverse` (not a
/// derived `Ord` on a hand-rolled newtype) is what actually inverts the
/// comparison; deriving `Ord` on a single-field tuple struct would just
/// delegate to the field's own order and iterate ascending.
type Reverse = std::cmp::Reverse<Price>;

/// The live, order-indexed book for a single instrument. Bids are kept
/// highest-price-first, asks lowest-price-first. Every operation is handed
/// the side and price explicitly by the caller (the venue message always
/// carries both), so no reverse order-id index is needed.
#[derive(Debug, Clone)]
pub struct OrderBasedBook {
    instrument: Instrument,
    bids: BTreeMap<Reverse, OrderBasedLevel>,
    asks: BTreeMap<Price, OrderBasedLevel>,
}

impl OrderBasedBook {
    pub fn new(instrument: Instrument) -> Self {
        OrderBasedBook {
            instrument,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Resets the book to empty. Used when recovery replaces the book
    /// wholesale from a REST snapshot.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    /// Inserts a new resting order, creating the level if needed. A
    /// duplicate order id at the same side/price replaces in place;
    /// cross-side or cross-price duplicates are caller error and are not
    /// guarded against here, matching upstream sequence discipline.
    pub fn add_order(&mut self, side: Side, order_id: OrderId, price: Price, qty: Quantity) {
        self.level_mut_or_insert(side, price).orders.insert(order_id, qty);
    }

    /// Updates the resting quantity of an existing order at (side, price).
    /// Returns `false` if no such order exists. Insertion order is
    /// preserved — this never re-pegs the entry to the back of its level.
    pub fn change_order(&mut self, side: Side, order_id: &OrderId, price: Price, new_qty: Quantity) -> bool {
        let Some(level) = self.level_mut(side, price) else {
            return false;
        };
        match level.orders.get_mut(order_id) {
            Some(qty) => {
                *qty = new_qty;
                true
            }
            None => false,
        }
    }

    /// Removes an order entirely, dropping the level if it becomes empty.
    /// Returns `false` if no such order exists.
    pub fn remove_order(&mut self, side: Side, order_id: &OrderId, price: Price) -> bool {
        let Some(level) = self.level_mut(side, price) else {
            return false;
        };
        let removed = level.orders.shift_remove(order_id).is_some();
        if removed && level.is_empty() {
            self.remove_level(side, price);
        }
        removed
    }

    /// Subtracts `trade_qty` from a resting order, clamping at zero;
    /// removes the order (and level, if empty) once fully filled. Returns
    /// `false` if no such order exists.
    pub fn match_order(&mut self, side: Side, order_id: &OrderId, price: Price, trade_qty: Quantity) -> bool {
        let Some(level) = self.level_mut(side, price) else {
            return false;
        };
        let Some(qty) = level.orders.get_mut(order_id) else {
            return false;
        };
        *qty = *qty - trade_qty;
        if qty.is_zero() {
            level.orders.shift_remove(order_id);
            if level.is_empty() {
                self.remove_level(side, price);
            }
        }
        true
    }

    fn level_mut(&mut self, side: Side, price: Price) -> Option<&mut OrderBasedLevel> {
        match side {
            Side::Bid => self.bids.get_mut(&Reverse(price)),
            Side::Ask => self.asks.get_mut(&price),
        }
    }

    fn level_mut_or_insert(&mut self, side: Side, price: Price) -> &mut OrderBasedLevel {
        match side {
            Side::Bid => self.bids.entry(Reverse(price)).or_insert_with(|| OrderBasedLevel::new(price)),
            Side::Ask => self.asks.entry(price).or_insert_with(|| OrderBasedLevel::new(price)),
        }
    }

    fn remove_level(&mut self, side: Side, price: Price) {
        match side {
            Side::Bid => {
                self.bids.remove(&Reverse(price));
            }
            Side::Ask => {
                self.asks.remove(&price);
            }
        }
    }

    /// Builds an immutable, aggregated snapshot of the current book state.
    pub fn snapshot(&self, sequence_id: u64) -> BookSnapshot {
        BookSnapshot {
            instrument: self.instrument.clone(),
            sequence_id,
            bids: self.bids.values().map(Level::from).collect(),
            asks: self.asks.values().map(Level::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> OrderBasedBook {
        OrderBasedBook::new(Instrument::new("BTC", "USD", "GDAX"))
    }

    fn px(s: &str) -> Price {
        Price::parse(s).unwrap()
    }

    fn qty(s: &str) -> Quantity {
        Quantity::parse(s).unwrap()
    }

    #[test]
    fn bids_sort_best_first_descending() {
        let mut b = book();
        b.add_order(Side::Bid, OrderId::new("1"), px("100"), qty("1"));
        b.add_order(Side::Bid, OrderId::new("2"), px("101"), qty("1"));
        b.add_order(Side::Bid, OrderId::new("3"), px("99"), qty("1"));
        let snap = b.snapshot(1);
        let prices: Vec<_> = snap.bids.iter().map(|l| l.price.to_string()).collect();
        assert_eq!(prices, vec!["101", "100", "99"]);
    }

    #[test]
    fn asks_sort_best_first_ascending() {
        let mut b = book();
        b.add_order(Side::Ask, OrderId::new("1"), px("100"), qty("1"));
        b.add_order(Side::Ask, OrderId::new("2"), px("99"), qty("1"));
        let snap = b.snapshot(1);
        let prices: Vec<_> = snap.asks.iter().map(|l| l.price.to_string()).collect();
        assert_eq!(prices, vec!["99", "100"]);
    }

    #[test]
    fn level_qty_sums_resting_orders() {
        let mut b = book();
        b.add_order(Side::Bid, OrderId::new("1"), px("100"), qty("1"));
        b.add_order(Side::Bid, OrderId::new("2"), px("100"), qty("2"));
        let snap = b.snapshot(1);
        assert_eq!(snap.bids[0].qty, qty("3"));
        assert_eq!(snap.bids[0].order_count, 2);
    }

    #[test]
    fn empty_levels_are_never_retained() {
        let mut b = book();
        b.add_order(Side::Bid, OrderId::new("1"), px("100"), qty("1"));
        assert!(b.remove_order(Side::Bid, &OrderId::new("1"), px("100")));
        assert!(b.is_empty());
        assert_eq!(b.snapshot(1).bids.len(), 0);
    }

    #[test]
    fn match_order_clamps_at_zero_and_removes_when_filled() {
        let mut b = book();
        b.add_order(Side::Bid, OrderId::new("1"), px("100"), qty("1"));
        assert!(b.match_order(Side::Bid, &OrderId::new("1"), px("100"), qty("5")));
        assert!(b.is_empty());
    }

    #[test]
    fn match_order_survives_partial_fill() {
        let mut b = book();
        b.add_order(Side::Bid, OrderId::new("1"), px("100"), qty("2"));
        assert!(b.match_order(Side::Bid, &OrderId::new("1"), px("100"), qty("0.5")));
        assert_eq!(b.snapshot(1).bids[0].qty, qty("1.5"));
    }

    #[test]
    fn change_order_updates_resting_quantity_preserving_position() {
        let mut b = book();
        b.add_order(Side::Bid, OrderId::new("A"), px("100"), qty("1"));
        b.add_order(Side::Bid, OrderId::new("B"), px("100"), qty("1"));
        assert!(b.change_order(Side::Bid, &OrderId::new("A"), px("100"), qty("5")));
        let snap = b.snapshot(1);
        assert_eq!(snap.bids[0].qty, qty("6"));
        assert_eq!(snap.bids[0].order_count, 2);
    }

    #[test]
    fn unknown_order_id_operations_report_false() {
        let mut b = book();
        assert!(!b.change_order(Side::Bid, &OrderId::new("ghost"), px("100"), qty("1")));
        assert!(!b.remove_order(Side::Bid, &OrderId::new("ghost"), px("100")));
        assert!(!b.match_order(Side::Bid, &OrderId::new("ghost"), px("100"), qty("1")));
    }

    #[test]
    fn duplicate_add_order_replaces_in_place() {
        let mut b = book();
        b.add_order(Side::Bid, OrderId::new("1"), px("100"), qty("1"));
        b.add_order(Side::Bid, OrderId::new("1"), px("100"), qty("2"));
        let snap = b.snapshot(1);
        assert_eq!(snap.bids.len(), 1);
        assert_eq!(snap.bids[0].qty, qty("2"));
        assert_eq!(snap.bids[0].order_count, 1);
    }

    #[test]
    fn clear_empties_both_sides() {
        let mut b = book();
        b.add_order(Side::Bid, OrderId::new("1"), px("100"), qty("1"));
        b.add_order(Side::Ask, OrderId::new("2"), px("101"), qty("1"));
        b.clear();
        assert!(b.is_empty());
    }

    #[test]
    fn top_n_limits_levels_per_side() {
        let mut b = book();
        for i in 0..10u32 {
            b.add_order(
                Side::Bid,
                OrderId::new(format!("b{i}")),
                px(&(100 - i).to_string()),
                qty("1"),
            );
        }
        let snap = b.snapshot(1);
        let (bids, _) = snap.top(3);
        assert_eq!(bids.len(), 3);
        assert_eq!(bids[0].price, px("100"));
    }
}
