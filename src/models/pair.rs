use serde::{Deserialize, Serialize};

/// A trading pair split into its two assets
///
/// `BTC/BRL` trades the base asset `BTC` against the quote asset `BRL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub base: String,
    pub quote: String,
}

impl Pair {
    /// Parse a `BASE/QUOTE` pair string
    pub fn parse(pair: &str) -> Option<Self> {
        let (base, quote) = pair.split_once('/')?;
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return None;
        }
        Some(Self {
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }

    /// Key used by the pair availability check (`btc_brl`)
    pub fn availability_key(&self) -> String {
        format!("{}_{}", self.base, self.quote).to_lowercase()
    }

    /// Key used by fee schedules (`btcbrl`)
    pub fn fee_key(&self) -> String {
        format!("{}{}", self.base, self.quote).to_lowercase()
    }

    /// Ledger coin for the base asset
    pub fn base_coin(&self) -> String {
        self.base.to_lowercase()
    }

    /// Ledger coin for the quote asset
    pub fn quote_coin(&self) -> String {
        self.quote.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        let pair = Pair::parse("BTC/BRL").unwrap();
        assert_eq!(pair.base, "BTC");
        assert_eq!(pair.quote, "BRL");
        assert_eq!(pair.availability_key(), "btc_brl");
        assert_eq!(pair.fee_key(), "btcbrl");
        assert_eq!(pair.base_coin(), "btc");
        assert_eq!(pair.quote_coin(), "brl");
    }

    #[test]
    fn test_reject_malformed_pairs() {
        assert!(Pair::parse("BTCBRL").is_none());
        assert!(Pair::parse("/BRL").is_none());
        assert!(Pair::parse("BTC/").is_none());
        assert!(Pair::parse("BTC/BRL/ETH").is_none());
    }
}
