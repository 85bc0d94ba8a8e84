//! Order Execution Engine Module
//!
//! This module contains the matching and settlement core:
//! - `finder` - Counter-order lookup for an identified order
//! - `fees` - Fee schedule resolution and fee amounts
//! - `economics` - Fill, price, total and fees of one match step
//! - `ledger` - One match step: records, trade, ledger batch, settlement
//! - `executor` - Execution loop over the candidates
//! - `compensation` - Account freezing after a failed run

pub mod compensation;
pub mod economics;
pub mod errors;
pub mod executor;
pub mod fees;
pub mod finder;
pub mod ledger;
pub mod locks;
pub mod notification;

// Re-export commonly used types for convenience
pub use compensation::FailureCompensation;
pub use economics::{TradeEconomics, TradeEconomicsCalculator};
pub use errors::ExecutionError;
pub use executor::{ExecutionStores, OrderExecutionEngine};
pub use fees::{calculate_fee, FeeResolver};
pub use finder::{CounterOrderFinder, MatchCandidates};
pub use ledger::{LedgerPoster, MatchStep, StepOutcome};
pub use locks::OrderLocks;
