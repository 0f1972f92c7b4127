//! Writes [`Update`]s to the persisted recording format (spec §6):
//! newline-delimited JSON, decimals as strings, one record per tick.
//! Grounded in `trading-infra/gateway/src/presentation/publisher.rs`'s
//! sync, `Mutex`-guarded sink and DTO-conversion style (`exchange-sim`'s
//! `presentation/rest/dto.rs`), swapped from bincode-over-IPC to
//! NDJSON-over-`Write` since this format has an external, file-based
//! consumer rather than an in-process one.

use std::io::Write;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use convex_core::{Level, Trade, Update};

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write record: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct LevelDto {
    price: String,
    qty: String,
    orders: usize,
}

impl From<&Level> for LevelDto {
    fn from(level: &Level) -> Self {
        LevelDto {
            price: level.price.to_string(),
            qty: level.qty.to_string(),
            orders: level.order_count,
        }
    }
}

#[derive(Debug, Serialize)]
struct BookDto {
    sequence: u64,
    bids: Vec<LevelDto>,
    asks: Vec<LevelDto>,
}

#[derive(Debug, Serialize)]
struct TradeDto {
    price: String,
    qty: String,
    sequence: u64,
    aggressor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    maker_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    taker_order_id: Option<String>,
}

impl From<&Trade> for TradeDto {
    fn from(trade: &Trade) -> Self {
        TradeDto {
            price: trade.price.to_string(),
            qty: trade.qty.to_string(),
            sequence: trade.sequence_id,
            aggressor: trade.aggressor_side.to_string(),
            maker_order_id: trade.maker_order_id.as_ref().map(|id| id.to_string()),
            taker_order_id: trade.taker_order_id.as_ref().map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct RecordDto {
    instrument: String,
    status: String,
    timestamp: String,
    book: BookDto,
    trades: Vec<TradeDto>,
}

impl From<&Update> for RecordDto {
    fn from(update: &Update) -> Self {
        RecordDto {
            instrument: update.instrument.to_string(),
            status: update.status.to_string(),
            timestamp: update.timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            book: BookDto {
                sequence: update.book.sequence_id,
                bids: update.book.bids.iter().map(LevelDto::from).collect(),
                asks: update.book.asks.iter().map(LevelDto::from).collect(),
            },
            trades: update.trades().map(TradeDto::from).collect(),
        }
    }
}

/// Appends one NDJSON line per [`Update`] to any `Write` sink. Safe to
/// share across tasks; each `record` call serializes and writes under a
/// single lock, so lines from concurrent callers never interleave.
pub struct Recorder<W: Write + Send> {
    sink: Mutex<W>,
}

impl<W: Write + Send> Recorder<W> {
    pub fn new(sink: W) -> Self {
        Recorder {
            sink: Mutex::new(sink),
        }
    }

    /// Serializes `update` per spec §6's format and writes it as one line.
    pub fn record(&self, update: &Update) -> Result<(), RecorderError> {
        let dto = RecordDto::from(update);
        let mut line = serde_json::to_string(&dto)?;
        line.push('\n');
        let mut sink = self.sink.lock();
        sink.write_all(line.as_bytes())?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), RecorderError> {
        self.sink.lock().flush()?;
        Ok(())
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

    fn sample_update() -> Update {
        let book = BookSnapshot {
            instrument: instrument(),
            sequence_id: 11,
            bids: vec![Level {
                price: Price::parse("100.00").unwrap(),
                qty: Quantity::parse("1.0").unwrap(),
                order_count: 1,
            }],
            asks: vec![],
        };
        let trade = Trade::new(
            instrument(),
            Side::Ask,
            Price::parse("100.00").unwrap(),
            Quantity::parse("0.5").unwrap(),
            11,
            Some(OrderId::new("A")),
            None,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        );
        Update::new(
            instrument(),
            book,
            Status::Ok,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            vec![],
            vec![trade],
        )
    }

    #[test]
    fn record_writes_one_ndjson_line_with_string_decimals() {
        let buf: Vec<u8> = Vec::new();
        let recorder = Recorder::new(buf);
        recorder.record(&sample_update()).unwrap();

        let written = recorder.sink.lock().clone();
        let text = String::from_utf8(written).unwrap();
        assert_eq!(text.matches('\n').count(), 1);

        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["instrument"], "BTCUSD@GDAX");
        assert_eq!(value["status"], "OK");
        assert_eq!(value["book"]["sequence"], 11);
        assert_eq!(value["book"]["bids"][0]["price"], "100");
        assert_eq!(value["trades"][0]["aggressor"], "Side.ASK");
    }

    /// P7: decimals round-trip through the string wire format exactly.
    #[test]
    fn decimal_round_trips_through_recorded_line() {
        let buf: Vec<u8> = Vec::new();
        let recorder = Recorder::new(buf);
        recorder.record(&sample_update()).unwrap();
        let written = recorder.sink.lock().clone();
        let text = String::from_utf8(written).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        let qty: Quantity = value["book"]["bids"][0]["qty"]
            .as_str()
            .unwrap()
            .parse::<rust_decimal::Decimal>()
            .map(|d| Quantity::new(d).unwrap())
            .unwrap();
        assert_eq!(qty, Quantity::parse("1.0").unwrap());
    }
}
