//! REST client for the venue's level-3 full-depth snapshot endpoint (spec
//! §6: `GET /products/<SYM>/book?level=3`). Grounded in
//! `trading-infra/gateway/src/infrastructure/rest_client.rs`'s `get`/
//! `handle_response` shape, trimmed to the one endpoint recovery needs.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{FetchError, RawOrder, RawSnapshot, SnapshotFetcher};

#[derive(Debug, Error)]
pub enum RestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("venue API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse snapshot response: {0}")]
    Parse(String),
}

impl From<RestError> for FetchError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Http(e) => FetchError::Network(e.to_string()),
            RestError::Api { status, body } => FetchError::Api {
                code: status as i32,
                message: body,
            },
            RestError::Parse(msg) => FetchError::Parse(msg),
        }
    }
}

/// The level-3 response shape, before it's turned into [`RawSnapshot`]:
/// each entry is `[price, size, order_id]`.
#[derive(Debug, Deserialize)]
struct RawLevel3Response {
    sequence: u64,
    bids: Vec<[String; 3]>,
    asks: Vec<[String; 3]>,
}

fn to_raw_order(entry: [String; 3]) -> RawOrder {
    let [price, qty, order_id] = entry;
    RawOrder {
        order_id,
        price,
        qty,
    }
}

/// Fetches full-depth snapshots over REST. The base URL is supplied by the
/// caller — sandbox vs. production selection is outside this crate (spec §9
/// Open Question).
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        RestClient {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn get_book_level3(&self, product_id: &str) -> Result<RawSnapshot, RestError> {
        let url = format!("{}/products/{}/book?level=3", self.base_url, product_id);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(RestError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: RawLevel3Response =
            serde_json::from_str(&text).map_err(|e| RestError::Parse(e.to_string()))?;
        Ok(RawSnapshot {
            sequence: parsed.sequence,
            bids: parsed.bids.into_iter().map(to_raw_order).collect(),
            asks: parsed.asks.into_iter().map(to_raw_order).collect(),
        })
    }
}

#[async_trait]
impl SnapshotFetcher for RestClient {
    async fn fetch_snapshot(&self, product_id: &str) -> Result<RawSnapshot, FetchError> {
        self.get_book_level3(product_id)
            .await
            .map_err(FetchError::from)
    }
}
