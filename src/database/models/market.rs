use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::models::{CoinInfo, FeeRates};

use super::is_set;

/// Per-user fee override
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::database::schema::custom_fees)]
#[diesel(primary_key(id))]
pub struct CustomFeeRow {
    pub id: i64,
    pub user_id: i64,
    pub pair: String,
    pub maker_rate: Option<Decimal>,
    pub taker_rate: Option<Decimal>,
}

/// Row of the default fee schedule
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::database::schema::default_fees)]
#[diesel(primary_key(id))]
pub struct DefaultFeeRow {
    pub id: i64,
    pub pair: String,
    pub maker_rate: Decimal,
    pub taker_rate: Decimal,
}

/// Listed coin
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::database::schema::coins)]
pub struct CoinRow {
    pub symbol: String,
    pub fiat: i16,
    pub currency_symbol: String,
    pub active: i16,
}

impl From<CustomFeeRow> for FeeRates {
    fn from(row: CustomFeeRow) -> Self {
        Self {
            maker: row.maker_rate,
            taker: row.taker_rate,
        }
    }
}

impl From<DefaultFeeRow> for FeeRates {
    fn from(row: DefaultFeeRow) -> Self {
        FeeRates::new(row.maker_rate, row.taker_rate)
    }
}

impl From<CoinRow> for CoinInfo {
    fn from(row: CoinRow) -> Self {
        Self {
            symbol: row.symbol,
            // Any positive fiat weight counts as fiat-pegged
            fiat_pegged: row.fiat >= 1,
            currency_symbol: row.currency_symbol,
        }
    }
}

impl CoinRow {
    pub fn is_active(&self) -> bool {
        is_set(self.active)
    }
}
