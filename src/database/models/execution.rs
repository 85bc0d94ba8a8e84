use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::database::connection::DatabaseError;
use crate::models::{ExecutionRecord, NewExecutionRecord, NewTrade, OrderSide, Trade};

use super::{flag, is_set};

/// Executed order entity (one leg of a match)
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::database::schema::executed_orders)]
#[diesel(primary_key(id))]
pub struct ExecutionRow {
    pub id: i64,
    pub execution_id: String,
    pub int_done: i16,
    pub order_id: i64,
    pub side: String,
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

/// New executed order for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::executed_orders)]
pub struct NewExecutionRow {
    pub execution_id: String,
    pub int_done: i16,
    pub order_id: i64,
    pub side: String,
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

/// Trade entity
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::database::schema::trades)]
#[diesel(primary_key(id))]
pub struct TradeRow {
    pub id: i64,
    pub user_id_active: String,
    pub user_id_passive: String,
    pub order_id: i64,
    pub order_compatible_id: i64,
    pub side: String,
    pub pair: String,
    pub amount_executed: Decimal,
    pub price_unity: Decimal,
    pub execution_id: String,
    pub time_executed: DateTime<Utc>,
}

/// New trade for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::trades)]
pub struct NewTradeRow {
    pub user_id_active: String,
    pub user_id_passive: String,
    pub order_id: i64,
    pub order_compatible_id: i64,
    pub side: String,
    pub pair: String,
    pub amount_executed: Decimal,
    pub price_unity: Decimal,
    pub execution_id: String,
    pub time_executed: DateTime<Utc>,
}

fn parse_side(id: i64, side: &str) -> Result<OrderSide, DatabaseError> {
    OrderSide::parse(side)
        .ok_or_else(|| DatabaseError::InvalidRow(format!("row {} has unknown side '{}'", id, side)))
}

impl From<&NewExecutionRecord> for NewExecutionRow {
    fn from(record: &NewExecutionRecord) -> Self {
        Self {
            execution_id: record.execution_id.clone(),
            int_done: flag(record.int_done),
            order_id: record.order_id,
            side: record.side.as_str().to_string(),
            pair: record.pair.clone(),
            user_id: record.user_id,
            price_unity: record.price_unity,
            order_amount: record.order_amount,
            amount_executed: record.amount_executed,
            fee: record.fee,
            amount_left: record.amount_left,
            total: record.total,
            time_executed: record.time_executed,
            done_with: record.done_with,
        }
    }
}

impl TryFrom<ExecutionRow> for ExecutionRecord {
    type Error = DatabaseError;

    fn try_from(row: ExecutionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            side: parse_side(row.id, &row.side)?,
            id: row.id,
            execution_id: row.execution_id,
            int_done: is_set(row.int_done),
            order_id: row.order_id,
            pair: row.pair,
            user_id: row.user_id,
            price_unity: row.price_unity,
            order_amount: row.order_amount,
            amount_executed: row.amount_executed,
            fee: row.fee,
            amount_left: row.amount_left,
            total: row.total,
            time_executed: row.time_executed,
            done_with: row.done_with,
        })
    }
}

impl From<&NewTrade> for NewTradeRow {
    fn from(trade: &NewTrade) -> Self {
        Self {
            user_id_active: trade.user_id_active.clone(),
            user_id_passive: trade.user_id_passive.clone(),
            order_id: trade.order_id,
            order_compatible_id: trade.order_compatible_id,
            side: trade.side.as_str().to_string(),
            pair: trade.pair.clone(),
            amount_executed: trade.amount_executed,
            price_unity: trade.price_unity,
            execution_id: trade.execution_id.clone(),
            time_executed: trade.time_executed,
        }
    }
}

impl TryFrom<TradeRow> for Trade {
    type Error = DatabaseError;

    fn try_from(row: TradeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            side: parse_side(row.id, &row.side)?,
            id: row.id,
            user_id_active: row.user_id_active,
            user_id_passive: row.user_id_passive,
            order_id: row.order_id,
            order_compatible_id: row.order_compatible_id,
            pair: row.pair,
            amount_executed: row.amount_executed,
            price_unity: row.price_unity,
            execution_id: row.execution_id,
            time_executed: row.time_executed,
        })
    }
}
