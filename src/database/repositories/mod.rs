/// Repository pattern implementations, one trait per entity
///
/// Each trait has a diesel implementation here and an in-memory
/// implementation in `crate::testing`.

pub mod coin_repository;
pub mod execution_repository;
pub mod fee_repository;
pub mod ledger_repository;
pub mod order_repository;

pub use coin_repository::{CoinRepository, CoinRepositoryImpl};
pub use execution_repository::{ExecutionRepository, ExecutionRepositoryImpl};
pub use fee_repository::{FeeRepository, FeeRepositoryImpl};
pub use ledger_repository::{LedgerRepository, LedgerRepositoryImpl};
pub use order_repository::{
    CandidateQuery, OrderRepository, OrderRepositoryImpl, PriceBound, PriceOrder,
};
