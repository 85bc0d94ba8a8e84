use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::CoinRow;
use crate::database::schema::{coins, pairs};
use crate::models::CoinInfo;
use diesel::prelude::*;
use std::sync::Arc;

/// Coin repository trait - listed coins and tradable pairs
pub trait CoinRepository: Send + Sync {
    /// Find a coin by upper-case symbol if it is listed and active
    fn find_active_coin(&self, symbol: &str) -> Result<Option<CoinInfo>, DatabaseError>;

    /// Check whether a pair (`btc_brl` form) is open for trading
    fn is_pair_active(&self, pair_key: &str) -> Result<bool, DatabaseError>;
}

/// Concrete implementation of CoinRepository
pub struct CoinRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl CoinRepositoryImpl {
    /// Create new coin repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl CoinRepository for CoinRepositoryImpl {
    fn find_active_coin(&self, symbol: &str) -> Result<Option<CoinInfo>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let row = coins::table
            .filter(coins::symbol.eq(symbol.to_uppercase()))
            .select(CoinRow::as_select())
            .first::<CoinRow>(&mut conn)
            .optional()?;

        Ok(row.filter(CoinRow::is_active).map(CoinInfo::from))
    }

    fn is_pair_active(&self, pair_key: &str) -> Result<bool, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let active = pairs::table
            .filter(pairs::pair_key.eq(pair_key))
            .select(pairs::active)
            .first::<i16>(&mut conn)
            .optional()?;

        Ok(matches!(active, Some(flag) if flag != 0))
    }
}
