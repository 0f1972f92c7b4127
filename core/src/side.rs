use serde::{Deserialize, Serialize};

/// Which side of the book an order or trade sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// The other side. `opposite` is its own involution: `s.opposite().opposite() == s`.
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Parse the venue's `"buy"`/`"sell"` wire vocabulary.
    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "buy" => Some(Side::Bid),
            "sell" => Some(Side::Ask),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Bid => write!(f, "Side.BID"),
            Side::Ask => write!(f, "Side.ASK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
        assert_eq!(Side::Bid.opposite().opposite(), Side::Bid);
    }

    #[test]
    fn parse_wire_vocabulary() {
        assert_eq!(Side::parse("buy"), Some(Side::Bid));
        assert_eq!(Side::parse("sell"), Some(Side::Ask));
        assert_eq!(Side::parse("unknown"), None);
    }
}
