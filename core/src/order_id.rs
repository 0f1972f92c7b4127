use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque, venue-issued order identifier. Unique within a venue's lifetime of
/// a book; never minted by this process. `Arc<str>` keeps clones cheap since
/// the same id flows through the book, trade records and replay buffers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Arc<str>);

impl OrderId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        OrderId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        OrderId(Arc::from(s))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        OrderId(Arc::from(s))
    }
}
