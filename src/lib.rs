// Library Crate Root
// lib.rs

// main.rs imports through lib.rs like an external crate
pub mod api;
pub mod collaborators;
pub mod config;
pub mod database;
pub mod engine;
pub mod models;
pub mod rabbitmq;
pub mod side_effects;
// In-memory stores and recording collaborators for tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;

// pub use = re-export at crate root
pub use api::{create_router, AppState};
pub use engine::{ExecutionError, OrderExecutionEngine};
pub use models::{ExecutedOrderSummary, ExecutionOutcome, Order, OrderSide, Pair};
