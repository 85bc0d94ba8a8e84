use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderSide;

/// Public trade-history record of one match, seen from the identified order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    /// Public uid of the identified order's owner
    pub user_id_active: String,
    /// Public uid of the counter-order's owner
    pub user_id_passive: String,
    pub order_id: i64,
    pub order_compatible_id: i64,
    pub side: OrderSide,
    pub pair: String,
    pub amount_executed: Decimal,
    pub price_unity: Decimal,
    pub execution_id: String,
    pub time_executed: DateTime<Utc>,
}

/// Trade to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub user_id_active: String,
    pub user_id_passive: String,
    pub order_id: i64,
    pub order_compatible_id: i64,
    pub side: OrderSide,
    pub pair: String,
    pub amount_executed: Decimal,
    pub price_unity: Decimal,
    pub execution_id: String,
    pub time_executed: DateTime<Utc>,
}

impl NewTrade {
    /// Attach the id assigned by the store
    pub fn into_trade(self, id: i64) -> Trade {
        Trade {
            id,
            user_id_active: self.user_id_active,
            user_id_passive: self.user_id_passive,
            order_id: self.order_id,
            order_compatible_id: self.order_compatible_id,
            side: self.side,
            pair: self.pair,
            amount_executed: self.amount_executed,
            price_unity: self.price_unity,
            execution_id: self.execution_id,
            time_executed: self.time_executed,
        }
    }

    /// Get the total trade value
    pub fn value(&self) -> Decimal {
        self.price_unity * self.amount_executed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trade_creation() {
        let trade = NewTrade {
            user_id_active: "buyer1".to_string(),
            user_id_passive: "seller1".to_string(),
            order_id: 1,
            order_compatible_id: 2,
            side: OrderSide::Buy,
            pair: "BTC/BRL".to_string(),
            amount_executed: dec!(100),
            price_unity: dec!(150.50),
            execution_id: "exec".to_string(),
            time_executed: Utc::now(),
        };

        assert_eq!(trade.value(), dec!(15050.00));

        let stored = trade.into_trade(9);
        assert_eq!(stored.id, 9);
        assert_eq!(stored.pair, "BTC/BRL");
        assert_eq!(stored.amount_executed, dec!(100));
    }
}
