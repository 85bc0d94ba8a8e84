use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{CustomFeeRow, DefaultFeeRow};
use crate::database::schema::{custom_fees, default_fees};
use crate::models::FeeRates;
use diesel::prelude::*;
use std::sync::Arc;

/// Fee repository trait - custom and default fee schedules
///
/// Pairs are addressed by their fee key (`btcbrl`).
pub trait FeeRepository: Send + Sync {
    /// Per-user override rates for a pair, if any
    fn find_custom_rates(&self, user_id: i64, fee_key: &str) -> Result<Option<FeeRates>, DatabaseError>;

    /// Most recent default schedule row for a pair
    fn find_latest_default_rates(&self, fee_key: &str) -> Result<Option<FeeRates>, DatabaseError>;
}

/// Concrete implementation of FeeRepository
pub struct FeeRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl FeeRepositoryImpl {
    /// Create new fee repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl FeeRepository for FeeRepositoryImpl {
    fn find_custom_rates(&self, user_id: i64, fee_key: &str) -> Result<Option<FeeRates>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let row = custom_fees::table
            .filter(custom_fees::user_id.eq(user_id))
            .filter(custom_fees::pair.eq(fee_key))
            .order(custom_fees::id.desc())
            .select(CustomFeeRow::as_select())
            .first::<CustomFeeRow>(&mut conn)
            .optional()?;

        Ok(row.map(FeeRates::from))
    }

    fn find_latest_default_rates(&self, fee_key: &str) -> Result<Option<FeeRates>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let row = default_fees::table
            .filter(default_fees::pair.eq(fee_key))
            .order(default_fees::id.desc())
            .select(DefaultFeeRow::as_select())
            .first::<DefaultFeeRow>(&mut conn)
            .optional()?;

        Ok(row.map(FeeRates::from))
    }
}
