pub mod execution;
pub mod ledger;
pub mod market;
pub mod order;

pub use execution::{ExecutionRow, NewExecutionRow, NewTradeRow, TradeRow};
pub use ledger::NewTransactionRow;
pub use market::{CoinRow, CustomFeeRow, DefaultFeeRow};
pub use order::{OrderRow, OrderSettlementChangeset, UserRow};

/// Encode a boolean flag as the 0/1 smallint the exchange schema uses
pub(crate) fn flag(value: bool) -> i16 {
    i16::from(value)
}

/// Decode a 0/1 smallint flag
pub(crate) fn is_set(value: i16) -> bool {
    value != 0
}
