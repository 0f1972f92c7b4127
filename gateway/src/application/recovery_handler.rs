//! Fetches a REST snapshot and replays buffered live messages that
//! post-date it. Grounded in `exchanges/gdax/recovery_handler.py`'s
//! buffer-then-replay shape, generalized to a cancellable async fetch
//! (REDESIGN FLAGS: the in-flight HTTP task must be abortable on a nested
//! gap).

use std::collections::VecDeque;
use std::sync::Arc;

use convex_core::{Instrument, OrderBasedBook, OrderId, Price, Quantity};

use crate::domain::{FetchError, RawSnapshot, SnapshotFetcher};
use crate::domain::events::VenueEvent;

/// Buffers in-flight WebSocket messages while a snapshot fetch is pending,
/// and replays the ones that apply after the snapshot lands.
pub struct RecoveryHandler {
    fetcher: Arc<dyn SnapshotFetcher>,
    buffered: VecDeque<VenueEvent>,
    bound: usize,
}

impl RecoveryHandler {
    pub fn new(fetcher: Arc<dyn SnapshotFetcher>) -> Self {
        RecoveryHandler {
            fetcher,
            buffered: VecDeque::new(),
            bound: usize::MAX,
        }
    }

    /// As [`RecoveryHandler::new`], but caps the number of buffered live
    /// messages: once `bound` is reached, the oldest buffered message is
    /// dropped to make room (a recovery that never completes must not grow
    /// memory without limit).
    pub fn with_bound(fetcher: Arc<dyn SnapshotFetcher>, bound: usize) -> Self {
        RecoveryHandler {
            fetcher,
            buffered: VecDeque::new(),
            bound: bound.max(1),
        }
    }

    /// Returns a clone of the injected snapshot fetcher, for callers (the
    /// feed gateway) that need to fetch outside of holding this handler's
    /// lock across an `.await`.
    pub fn fetcher(&self) -> Arc<dyn SnapshotFetcher> {
        Arc::clone(&self.fetcher)
    }

    /// HTTP GETs the venue's full-depth endpoint and materializes an
    /// [`OrderBasedBook`] by issuing one `add_order` per listed resting
    /// order (level 3). Returns the snapshot's sequence id and the book.
    pub async fn fetch_snapshot(
        &self,
        instrument: &Instrument,
    ) -> Result<(u64, OrderBasedBook), FetchError> {
        let raw = self.fetcher.fetch_snapshot(&instrument.product_id()).await?;
        Ok((raw.sequence, build_book(instrument.clone(), raw)))
    }

    /// Appends a live message observed while recovery is in flight.
    pub fn buffer(&mut self, event: VenueEvent) {
        if self.buffered.len() >= self.bound {
            tracing::warn!("recovery buffer at capacity, dropping oldest buffered message");
            self.buffered.pop_front();
        }
        self.buffered.push_back(event);
    }

    /// Discards everything buffered so far; used on a re-gap, since the
    /// prior snapshot attempt is now moot.
    pub fn drop_buffered(&mut self) {
        self.buffered.clear();
    }

    /// Pops buffered messages in FIFO order, applying `apply_fn` to each
    /// whose sequence is strictly greater than `snapshot_sequence`.
    /// Messages at or below it are already reflected in the snapshot and
    /// are discarded.
    pub fn replay(&mut self, snapshot_sequence: u64, mut apply_fn: impl FnMut(VenueEvent)) {
        while let Some(event) = self.buffered.pop_front() {
            if event.sequence() > snapshot_sequence {
                apply_fn(event);
            }
        }
    }

    pub fn has_buffered(&self) -> bool {
        !self.buffered.is_empty()
    }
}

/// Materializes an [`OrderBasedBook`] from a raw level-3 REST response by
/// issuing one `add_order` per listed resting order. Shared with
/// [`super::feed_gateway`], which fetches outside this handler's lock.
pub(crate) fn build_book(instrument: Instrument, raw: RawSnapshot) -> OrderBasedBook {
    use convex_core::Side;

    let mut book = OrderBasedBook::new(instrument);
    for order in raw.bids {
        if let (Ok(price), Ok(qty)) = (Price::parse(&order.price), Quantity::parse(&order.qty)) {
            book.add_order(Side::Bid, OrderId::new(order.order_id), price, qty);
        }
    }
    for order in raw.asks {
        if let (Ok(price), Ok(qty)) = (Price::parse(&order.price), Quantity::parse(&order.qty)) {
            book.add_order(Side::Ask, OrderId::new(order.order_id), price, qty);
        }
    }
    book
}
