use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::database::connection::DatabaseError;
use crate::models::{OperationType, Order, OrderSide, User};

use super::{flag, is_set};

/// User entity joined onto every order
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::database::schema::users)]
#[diesel(primary_key(id))]
pub struct UserRow {
    pub id: i64,
    pub uid: String,
    pub internal_account: i16,
}

/// Order entity
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::database::schema::orders)]
#[diesel(primary_key(id))]
pub struct OrderRow {
    pub id: i64,
    pub identificator: String,
    pub pair: String,
    pub side: String,
    pub operation_type: String,
    pub price_unity: Decimal,
    pub amount: Decimal,
    pub amount_source: Decimal,
    pub done: i16,
    pub del: i16,
    pub locked: i16,
    pub time: DateTime<Utc>,
    pub price_done: Option<Decimal>,
    pub time_done: Option<DateTime<Utc>>,
    pub user_id: i64,
}

/// Columns written back after a match step
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::database::schema::orders)]
#[diesel(treat_none_as_null = true)]
pub struct OrderSettlementChangeset {
    pub amount: Decimal,
    pub done: i16,
    pub locked: i16,
    pub price_done: Option<Decimal>,
    pub time_done: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uid: row.uid,
            internal_account: is_set(row.internal_account),
        }
    }
}

impl OrderRow {
    /// Combine the order row with its owner into the domain order
    pub fn into_order(self, user: UserRow) -> Result<Order, DatabaseError> {
        let side = OrderSide::parse(&self.side).ok_or_else(|| {
            DatabaseError::InvalidRow(format!("order {} has unknown side '{}'", self.id, self.side))
        })?;
        let operation_type = OperationType::parse(&self.operation_type).ok_or_else(|| {
            DatabaseError::InvalidRow(format!(
                "order {} has unknown operation type '{}'",
                self.id, self.operation_type
            ))
        })?;

        Ok(Order {
            id: self.id,
            identificator: self.identificator,
            pair: self.pair,
            side,
            operation_type,
            price_unity: self.price_unity,
            amount: self.amount,
            amount_source: self.amount_source,
            done: is_set(self.done),
            del: is_set(self.del),
            locked: is_set(self.locked),
            time: self.time,
            price_done: self.price_done,
            time_done: self.time_done,
            user: user.into(),
        })
    }
}

impl From<&Order> for OrderSettlementChangeset {
    fn from(order: &Order) -> Self {
        Self {
            amount: order.amount,
            done: flag(order.done),
            locked: flag(order.locked),
            price_done: order.price_done,
            time_done: order.time_done,
        }
    }
}
