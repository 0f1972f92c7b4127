//! Conflates a fast stream of [`Update`]s into a bounded ring buffer for a
//! slow consumer, without ever dropping a trade (spec §4.5, invariant P5).
//! Grounded in `rust-backend/src/scrapers/polymarket_book_store.rs`'s
//! cache-plus-`Notify` shape (`BookStore` holds per-token state behind a
//! lock and wakes waiting readers via `tokio::sync::Notify` on every
//! update); trade accounting is this spec's own addition, since that
//! cache only ever holds book snapshots.

use std::collections::VecDeque;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;

use convex_core::{Trade, Update};

use super::feed_gateway::UpdateCallback;

#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("no update available yet")]
    NoData,
}

struct SubscriberState {
    ring: VecDeque<Update>,
    capacity: usize,
    pending_trades: Vec<Trade>,
    last_sequence: Option<u64>,
    /// Set whenever `on_update` adds something new; cleared once a waiter
    /// consumes it. Distinct from "ring non-empty", since the ring can be
    /// non-empty with nothing new since the last `fetch`.
    signalled: bool,
}

/// A single consumer's view of one instrument's update stream: a bounded
/// ring of the last `K` book snapshots, plus every trade seen since the
/// consumer's last fetch, composed back onto the freshest snapshot on
/// delivery (spec §4.5).
pub struct Subscriber {
    state: Mutex<SubscriberState>,
    notify: Notify,
}

impl Subscriber {
    pub fn new(ring_capacity: usize) -> Self {
        Subscriber {
            state: Mutex::new(SubscriberState {
                ring: VecDeque::with_capacity(ring_capacity.max(1)),
                capacity: ring_capacity.max(1),
                pending_trades: Vec::new(),
                last_sequence: None,
                signalled: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Waits until an update is available, then returns it with every trade
    /// accumulated since the previous fetch folded in (P5: no trade is ever
    /// dropped by conflation, even though intermediate book snapshots are).
    pub async fn fetch(&self) -> Update {
        loop {
            if let Some(update) = self.try_compose() {
                return update;
            }
            self.notify.notified().await;
        }
    }

    /// Non-blocking variant of [`Subscriber::fetch`]; returns
    /// [`SubscriberError::NoData`] if nothing new has arrived.
    pub fn fetch_nowait(&self) -> Result<Update, SubscriberError> {
        self.try_compose().ok_or(SubscriberError::NoData)
    }

    fn try_compose(&self) -> Option<Update> {
        let mut state = self.state.lock();
        if !state.signalled {
            return None;
        }
        state.signalled = false;
        let latest = state.ring.back()?.clone();
        let trades = std::mem::take(&mut state.pending_trades);
        Some(latest.with_trades(trades))
    }
}

impl UpdateCallback for Subscriber {
    fn on_update(&self, update: &Update) {
        let mut state = self.state.lock();

        if let Some(last) = state.last_sequence {
            if update.book.sequence_id < last {
                tracing::warn!(
                    instrument = %update.instrument,
                    sequence = update.book.sequence_id,
                    last,
                    "dropping out-of-order update"
                );
                return;
            }
        }
        state.last_sequence = Some(update.book.sequence_id);

        state.pending_trades.extend(update.trades().cloned());

        if state.ring.len() == state.capacity {
            state.ring.pop_front();
        }
        state.ring.push_back(update.clone());
        state.signalled = true;
        drop(state);
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use convex_core::{BookSnapshot, Instrument, OrderId, Price, Quantity, Side, Status};

    fn instrument() -> Instrument {
        Instrument::new("BTC", "USD", "GDAX")
    }

    fn snapshot(seq: u64) -> BookSnapshot {
        BookSnapshot {
            instrument: instrument(),
            sequence_id: seq,
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    fn trade(seq: u64) -> Trade {
        Trade::new(
            instrument(),
            Side::Bid,
            Price::parse("100").unwrap(),
            Quantity::parse("1").unwrap(),
            seq,
            Some(OrderId::new("maker")),
            Some(OrderId::new("taker")),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn update(seq: u64, trades: Vec<Trade>) -> Update {
        let (before, after): (Vec<_>, Vec<_>) = trades.into_iter().partition(|t| t.sequence_id <= seq);
        Update::new(
            instrument(),
            snapshot(seq),
            Status::Ok,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            before,
            after,
        )
    }

    #[test]
    fn nothing_available_before_first_update() {
        let sub = Subscriber::new(4);
        assert!(matches!(sub.fetch_nowait(), Err(SubscriberError::NoData)));
    }

    #[test]
    fn fetch_nowait_returns_latest_snapshot_with_accumulated_trades() {
        let sub = Subscriber::new(4);
        sub.on_update(&update(10, vec![trade(10)]));
        sub.on_update(&update(11, vec![trade(11)]));

        let result = sub.fetch_nowait().unwrap();
        assert_eq!(result.book.sequence_id, 11);
        assert_eq!(result.trades().count(), 2);
    }

    /// P5: no trade is dropped even if intervening book snapshots are
    /// conflated away by a ring smaller than the number of updates.
    #[test]
    fn trades_survive_conflation_of_intermediate_snapshots() {
        let sub = Subscriber::new(1);
        for seq in 10..15u64 {
            sub.on_update(&update(seq, vec![trade(seq)]));
        }
        let result = sub.fetch_nowait().unwrap();
        assert_eq!(result.book.sequence_id, 14);
        assert_eq!(result.trades().count(), 5);
    }

    #[test]
    fn second_fetch_without_new_update_reports_no_data() {
        let sub = Subscriber::new(4);
        sub.on_update(&update(10, vec![]));
        assert!(sub.fetch_nowait().is_ok());
        assert!(matches!(sub.fetch_nowait(), Err(SubscriberError::NoData)));
    }

    #[test]
    fn out_of_order_update_is_dropped() {
        let sub = Subscriber::new(4);
        sub.on_update(&update(10, vec![]));
        sub.fetch_nowait().unwrap();
        sub.on_update(&update(5, vec![]));
        assert!(matches!(sub.fetch_nowait(), Err(SubscriberError::NoData)));
    }

    #[tokio::test]
    async fn fetch_wakes_once_update_arrives() {
        let sub = std::sync::Arc::new(Subscriber::new(4));
        let waiter = {
            let sub = sub.clone();
            tokio::spawn(async move { sub.fetch().await })
        };
        tokio::task::yield_now().await;
        sub.on_update(&update(10, vec![trade(10)]));
        let result = waiter.await.unwrap();
        assert_eq!(result.book.sequence_id, 10);
    }
}
