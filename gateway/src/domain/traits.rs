use async_trait::async_trait;
use thiserror::Error;

/// Domain-level error for snapshot fetching, kept free of any particular
/// HTTP client's error type — infrastructure implementations convert into
/// this.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("venue API error {code}: {message}")]
    Api { code: i32, message: String },
    #[error("failed to parse snapshot response: {0}")]
    Parse(String),
}

/// One resting order as reported by the venue's level-3 snapshot.
#[derive(Debug, Clone)]
pub struct RawOrder {
    pub order_id: String,
    pub price: String,
    pub qty: String,
}

/// The raw, unparsed full-depth response (spec §6: GET `/products/<SYM>/book?level=3`).
#[derive(Debug, Clone)]
pub struct RawSnapshot {
    pub sequence: u64,
    pub bids: Vec<RawOrder>,
    pub asks: Vec<RawOrder>,
}

/// Fetches a full-depth snapshot for a product id. Implemented by
/// [`crate::infrastructure::rest_client::RestClient`]; recovery accepts the
/// base URL from its caller (sandbox vs production selection is outside
/// this crate).
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch_snapshot(&self, product_id: &str) -> Result<RawSnapshot, FetchError>;
}
