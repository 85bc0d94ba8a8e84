use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Owner of an order as the execution core sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Internal id, used for ledger rows and account freezes
    pub id: i64,
    /// Public id, exposed in trades and execution responses
    pub uid: String,
    /// House/bridge account whose fills are mirrored externally
    pub internal_account: bool,
}

/// A resting or incoming order on the exchange
///
/// Orders are created and validated upstream; the execution core only reads,
/// locks, decrements and eventually marks them done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    /// Internal id; lower ids were created earlier
    pub id: i64,
    /// Public order identifier
    pub identificator: String,
    /// Trading pair in `BASE/QUOTE` form
    pub pair: String,
    pub side: OrderSide,
    pub operation_type: OperationType,
    #[schema(value_type = String, example = "100.00")]
    pub price_unity: Decimal,
    /// Remaining amount
    #[schema(value_type = String, example = "10")]
    pub amount: Decimal,
    /// Amount at creation time
    #[schema(value_type = String, example = "10")]
    pub amount_source: Decimal,
    pub done: bool,
    pub del: bool,
    pub locked: bool,
    pub time: DateTime<Utc>,
    /// Price of the last fill
    #[schema(value_type = Option<String>)]
    pub price_done: Option<Decimal>,
    /// Time of the last fill
    pub time_done: Option<DateTime<Utc>>,
    pub user: User,
}

/// Order side: Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Operation type: Market or Limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Market,
    Limit,
}

impl OrderSide {
    /// The side a counter-order must have
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "buy" => Some(OrderSide::Buy),
            "sell" => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Market => "market",
            OperationType::Limit => "limit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "market" => Some(OperationType::Market),
            "limit" => Some(OperationType::Limit),
            _ => None,
        }
    }
}

impl Order {
    /// Check whether the order can take part in a match right now
    ///
    /// An order is eligible while it is not done, not deleted, not locked and
    /// still has a positive remaining amount. Limit orders additionally need a
    /// positive price.
    pub fn is_eligible(&self) -> bool {
        let open = !self.done && !self.del && !self.locked && self.amount > Decimal::ZERO;
        match self.operation_type {
            OperationType::Limit => open && self.price_unity > Decimal::ZERO,
            OperationType::Market => open,
        }
    }

    pub fn is_limit(&self) -> bool {
        self.operation_type == OperationType::Limit
    }

    /// Check whether this order was placed before `other`
    pub fn placed_before(&self, other: &Order) -> bool {
        other.time > self.time
    }
}
