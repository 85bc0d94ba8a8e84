use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderSide;

/// One leg of an executed match
///
/// Both legs of a trade share `execution_id` and `time_executed`, and point at
/// each other through `done_with` once both rows exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: i64,
    pub execution_id: String,
    /// Set when this fill consumed the order's whole original amount
    pub int_done: bool,
    pub order_id: i64,
    pub side: OrderSide,
    pub pair: String,
    pub user_id: i64,
    pub price_unity: Decimal,
    pub order_amount: Decimal,
    pub amount_executed: Decimal,
    pub fee: Decimal,
    pub amount_left: Decimal,
    pub total: Decimal,
    pub time_executed: DateTime<Utc>,
    /// Counterpart execution record
    pub done_with: Option<i64>,
}

/// Execution record to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExecutionRecord {
    pub execution_id: String,
    pub int_done: bool,
    pub order_id: i64,
    pub side: OrderSide,
    pub pair: String,
    pub user_id: i64,
    pub price_unity: Decimal,
    pub order_amount: Decimal,
    pub amount_executed: Decimal,
    pub fee: Decimal,
    pub amount_left: Decimal,
    pub total: Decimal,
    pub time_executed: DateTime<Utc>,
    pub done_with: Option<i64>,
}

impl NewExecutionRecord {
    /// Attach the id assigned by the store
    pub fn into_record(self, id: i64) -> ExecutionRecord {
        ExecutionRecord {
            id,
            execution_id: self.execution_id,
            int_done: self.int_done,
            order_id: self.order_id,
            side: self.side,
            pair: self.pair,
            user_id: self.user_id,
            price_unity: self.price_unity,
            order_amount: self.order_amount,
            amount_executed: self.amount_executed,
            fee: self.fee,
            amount_left: self.amount_left,
            total: self.total,
            time_executed: self.time_executed,
            done_with: self.done_with,
        }
    }
}
