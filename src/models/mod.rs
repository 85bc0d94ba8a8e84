pub mod coin;
pub mod execution;
pub mod fee;
pub mod notification;
pub mod order;
pub mod outcome;
pub mod pair;
pub mod trade;
pub mod transaction;

pub use coin::CoinInfo;
pub use execution::{ExecutionRecord, NewExecutionRecord};
pub use fee::{FeeRates, FeeSlot};
pub use notification::{EmailQueuePayload, TradeNotice};
pub use order::{OperationType, Order, OrderSide, User};
pub use outcome::{ExecutedOrderSummary, ExecutionOutcome};
pub use pair::Pair;
pub use trade::{NewTrade, Trade};
pub use transaction::{LedgerLeg, NewTransaction};
