use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderSide;

/// Ledger entry: a signed balance movement of one coin for one user
///
/// Entries are append-only; nothing in the execution core updates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: i64,
    /// Lower-case coin symbol
    pub coin: String,
    pub amount: Decimal,
    /// Reserved funds being released
    pub is_retention: bool,
    pub kind: String,
    /// Order the movement belongs to
    pub item_id: i64,
    pub time: DateTime<Utc>,
}

/// Role of a ledger entry inside one side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerLeg {
    /// Value given up (negative)
    Value,
    /// Asset received (positive)
    Amount,
    /// Fee charged (negative)
    Fee,
    /// Release of the funds reserved when the order was placed (positive)
    Retention,
}

impl LedgerLeg {
    /// Transaction type tag for this leg on the given side
    pub fn kind(self, side: OrderSide) -> String {
        match self {
            LedgerLeg::Fee => format!("order_execution_{}_fee", side.as_str()),
            _ => format!("order_execution_{}", side.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(LedgerLeg::Value.kind(OrderSide::Buy), "order_execution_buy");
        assert_eq!(LedgerLeg::Retention.kind(OrderSide::Sell), "order_execution_sell");
        assert_eq!(LedgerLeg::Fee.kind(OrderSide::Sell), "order_execution_sell_fee");
    }
}
