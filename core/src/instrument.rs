use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// `(base_currency, quote_currency, venue_id)`. Equality and hashing are on
/// `(base, quote)` only — `venue_id` is carried for display and routing but
/// is not part of instrument identity (mirrors `Instrument._key()` in the
/// system this was distilled from, which never included the exchange in its
/// equality key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    base_currency: String,
    quote_currency: String,
    venue_id: String,
}

impl Instrument {
    pub fn new(
        base_currency: impl AsRef<str>,
        quote_currency: impl AsRef<str>,
        venue_id: impl Into<String>,
    ) -> Self {
        Instrument {
            base_currency: base_currency.as_ref().to_uppercase(),
            quote_currency: quote_currency.as_ref().to_uppercase(),
            venue_id: venue_id.into(),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn quote_currency(&self) -> &str {
        &self.quote_currency
    }

    pub fn venue_id(&self) -> &str {
        &self.venue_id
    }

    /// The venue's `BASE-QUOTE` product id (spec §6 WebSocket subscribe).
    pub fn product_id(&self) -> String {
        format!("{}-{}", self.base_currency, self.quote_currency)
    }

    fn key(&self) -> (&str, &str) {
        (&self.base_currency, &self.quote_currency)
    }
}

impl PartialEq for Instrument {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Instrument {}

impl Hash for Instrument {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}@{}",
            self.base_currency, self.quote_currency, self.venue_id
        )
    }
}
