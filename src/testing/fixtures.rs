use crate::models::{OperationType, Order, OrderSide, User};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// Fixed reference instant for fixture timestamps (2024-01-01T12:00:00Z)
pub fn base_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_110_400, 0).unwrap_or_default()
}

/// Builder for orders used across tests
///
/// Defaults: pair `BTC/BRL`, owner `user-{id}` with internal id `100 + id`,
/// placed `id` seconds after [`base_time`], open and unlocked.
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    order: Order,
}

impl OrderBuilder {
    pub fn new(
        id: i64,
        side: OrderSide,
        operation_type: OperationType,
        price: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            order: Order {
                id,
                identificator: format!("ord-{}", id),
                pair: "BTC/BRL".to_string(),
                side,
                operation_type,
                price_unity: price,
                amount,
                amount_source: amount,
                done: false,
                del: false,
                locked: false,
                time: base_time() + Duration::seconds(id),
                price_done: None,
                time_done: None,
                user: User {
                    id: 100 + id,
                    uid: format!("user-{}", id),
                    internal_account: false,
                },
            },
        }
    }

    pub fn limit_buy(id: i64, price: Decimal, amount: Decimal) -> Self {
        Self::new(id, OrderSide::Buy, OperationType::Limit, price, amount)
    }

    pub fn limit_sell(id: i64, price: Decimal, amount: Decimal) -> Self {
        Self::new(id, OrderSide::Sell, OperationType::Limit, price, amount)
    }

    pub fn market_buy(id: i64, amount: Decimal) -> Self {
        Self::new(id, OrderSide::Buy, OperationType::Market, Decimal::ZERO, amount)
    }

    pub fn market_sell(id: i64, amount: Decimal) -> Self {
        Self::new(id, OrderSide::Sell, OperationType::Market, Decimal::ZERO, amount)
    }

    pub fn user(mut self, id: i64, uid: &str) -> Self {
        self.order.user.id = id;
        self.order.user.uid = uid.to_string();
        self
    }

    pub fn internal(mut self) -> Self {
        self.order.user.internal_account = true;
        self
    }

    pub fn pair(mut self, pair: &str) -> Self {
        self.order.pair = pair.to_string();
        self
    }

    /// Override the market price (market orders keep whatever price they were quoted at)
    pub fn price(mut self, price: Decimal) -> Self {
        self.order.price_unity = price;
        self
    }

    pub fn placed_at(mut self, time: DateTime<Utc>) -> Self {
        self.order.time = time;
        self
    }

    /// Remaining amount after earlier partial fills
    pub fn remaining(mut self, amount: Decimal) -> Self {
        self.order.amount = amount;
        self
    }

    pub fn locked(mut self) -> Self {
        self.order.locked = true;
        self
    }

    pub fn done(mut self) -> Self {
        self.order.done = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.order.del = true;
        self
    }

    pub fn build(self) -> Order {
        self.order
    }
}
