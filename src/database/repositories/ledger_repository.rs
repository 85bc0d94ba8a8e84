use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::NewTransactionRow;
use crate::database::schema::transactions;
use crate::models::NewTransaction;
use diesel::prelude::*;
use std::sync::Arc;

/// Ledger repository trait - append-only balance movements
pub trait LedgerRepository: Send + Sync {
    /// Insert all entries in a single transaction
    ///
    /// Either every entry is written or none is.
    fn post_entries(&self, entries: &[NewTransaction]) -> Result<usize, DatabaseError>;
}

/// Concrete implementation of LedgerRepository
pub struct LedgerRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl LedgerRepositoryImpl {
    /// Create new ledger repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl LedgerRepository for LedgerRepositoryImpl {
    fn post_entries(&self, entries: &[NewTransaction]) -> Result<usize, DatabaseError> {
        let mut conn = (self.get_conn)()?;
        let rows: Vec<NewTransactionRow> = entries.iter().map(NewTransactionRow::from).collect();

        conn.transaction::<_, DatabaseError, _>(|conn| {
            let mut count = 0;
            for row in &rows {
                count += diesel::insert_into(transactions::table)
                    .values(row)
                    .execute(conn)?;
            }
            Ok(count)
        })
    }
}
