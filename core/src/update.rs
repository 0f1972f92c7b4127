use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::book::BookSnapshot;
use crate::instrument::Instrument;
use crate::status::Status;
use crate::trade::Trade;

/// A single emission from a market-data pipeline: a book snapshot, zero or
/// more trades that occurred alongside it, and the health status of the
/// feed at the moment it was produced. Trades are split by whether they
/// occurred before or after the snapshot's sequence id so a consumer can
/// replay them against the snapshot in the right order (mirrors
/// `market_data/update.py`, which carries two trade lists for the same
/// reason).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub instrument: Instrument,
    pub book: BookSnapshot,
    pub status: Status,
    pub timestamp: DateTime<Utc>,
    trades_before_book: Vec<Trade>,
    trades_after_book: Vec<Trade>,
}

impl Update {
    pub fn new(
        instrument: Instrument,
        book: BookSnapshot,
        status: Status,
        timestamp: DateTime<Utc>,
        trades_before_book: Vec<Trade>,
        trades_after_book: Vec<Trade>,
    ) -> Self {
        Update {
            instrument,
            book,
            status,
            timestamp,
            trades_before_book,
            trades_after_book,
        }
    }

    pub fn trades_before_book(&self) -> &[Trade] {
        &self.trades_before_book
    }

    pub fn trades_after_book(&self) -> &[Trade] {
        &self.trades_after_book
    }

    /// All trades carried by this update, in book-relative order.
    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades_before_book.iter().chain(self.trades_after_book.iter())
    }

    pub fn is_gapped(&self) -> bool {
        matches!(self.status, Status::Gapped)
    }

    /// Rebuilds this update with a replacement trade list, re-split around
    /// `book.sequence_id`. Used by the subscriber's conflation to compose a
    /// ring entry's latest book with the trades accumulated since the
    /// previous `fetch` (spec §4.5).
    pub fn with_trades(&self, trades: Vec<Trade>) -> Update {
        let book_id = self.book.sequence_id;
        let (before, after): (Vec<_>, Vec<_>) =
            trades.into_iter().partition(|t| t.sequence_id <= book_id);
        Update {
            instrument: self.instrument.clone(),
            book: self.book.clone(),
            status: self.status,
            timestamp: self.timestamp,
            trades_before_book: before,
            trades_after_book: after,
        }
    }
}
