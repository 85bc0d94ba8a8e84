use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::models::NewTransaction;

use super::flag;

/// New ledger transaction for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::transactions)]
pub struct NewTransactionRow {
    pub user_id: i64,
    pub coin: String,
    pub amount: Decimal,
    pub is_retention: i16,
    pub kind: String,
    pub item_id: i64,
    pub time: DateTime<Utc>,
}

impl From<&NewTransaction> for NewTransactionRow {
    fn from(entry: &NewTransaction) -> Self {
        Self {
            user_id: entry.user_id,
            coin: entry.coin.clone(),
            amount: entry.amount,
            is_retention: flag(entry.is_retention),
            kind: entry.kind.clone(),
            item_id: entry.item_id,
            time: entry.time,
        }
    }
}
