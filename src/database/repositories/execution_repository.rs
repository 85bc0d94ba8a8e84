use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{ExecutionRow, NewExecutionRow, NewTradeRow, TradeRow};
use crate::database::schema::{executed_orders, trades};
use crate::models::{ExecutionRecord, NewExecutionRecord, NewTrade, Trade};
use diesel::prelude::*;
use std::sync::Arc;

/// Execution repository trait - execution records and trade history
///
/// Each insert commits on its own; nothing here is part of the ledger batch.
pub trait ExecutionRepository: Send + Sync {
    /// Insert one leg of a match
    fn insert_execution(&self, record: &NewExecutionRecord) -> Result<ExecutionRecord, DatabaseError>;

    /// Point an execution record at its counterpart
    fn link_counterpart(&self, record_id: i64, counterpart_id: i64) -> Result<(), DatabaseError>;

    /// Insert the public trade record of a match
    fn insert_trade(&self, trade: &NewTrade) -> Result<Trade, DatabaseError>;
}

/// Concrete implementation of ExecutionRepository
pub struct ExecutionRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl ExecutionRepositoryImpl {
    /// Create new execution repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl ExecutionRepository for ExecutionRepositoryImpl {
    fn insert_execution(&self, record: &NewExecutionRecord) -> Result<ExecutionRecord, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let row = diesel::insert_into(executed_orders::table)
            .values(&NewExecutionRow::from(record))
            .returning(ExecutionRow::as_returning())
            .get_result::<ExecutionRow>(&mut conn)?;

        ExecutionRecord::try_from(row)
    }

    fn link_counterpart(&self, record_id: i64, counterpart_id: i64) -> Result<(), DatabaseError> {
        let mut conn = (self.get_conn)()?;

        diesel::update(executed_orders::table)
            .filter(executed_orders::id.eq(record_id))
            .set(executed_orders::done_with.eq(Some(counterpart_id)))
            .execute(&mut conn)?;

        Ok(())
    }

    fn insert_trade(&self, trade: &NewTrade) -> Result<Trade, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let row = diesel::insert_into(trades::table)
            .values(&NewTradeRow::from(trade))
            .returning(TradeRow::as_returning())
            .get_result::<TradeRow>(&mut conn)?;

        Trade::try_from(row)
    }
}
