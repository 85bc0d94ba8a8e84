//! Error types for order execution runs
//!
//! Every failure of a run surfaces as one [`ExecutionError`]. Persistence
//! errors pass through unchanged so the caller sees the store's own message.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::collaborators::ValidationError;
use crate::database::DatabaseError;

/// Errors that can end an execution run
///
/// # Error Categories
///
/// - **No match**: `NoCompatibleOrders`
/// - **Validation Errors**: `InvalidAsset`, `PriceInconsistency`
/// - **State Errors**: `OrderUnavailable`
/// - **Configuration Errors**: `FeeScheduleMissing`
/// - **Internal Errors**: `Persistence`
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The identified order is not eligible or nothing can trade against it
    #[error("No compatible orders")]
    NoCompatibleOrders,

    /// A coin of the pair could not be validated during a match step
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    /// Two limit orders that do not cross reached the economics step
    #[error(
        "Price inconsistency: order {identified_id} at {identified_price} cannot cross order {candidate_id} at {candidate_price}"
    )]
    PriceInconsistency {
        identified_id: i64,
        identified_price: Decimal,
        candidate_id: i64,
        candidate_price: Decimal,
    },

    /// The pair has no default fee schedule row
    #[error("No default fee schedule for pair {0}")]
    FeeScheduleMissing(String),

    /// The identified order was taken by another run
    #[error("Order unavailable: {0}")]
    OrderUnavailable(String),

    /// Store failure, message kept as reported
    #[error(transparent)]
    Persistence(#[from] DatabaseError),
}

impl ExecutionError {
    /// Returns true when the run found nothing to trade against
    pub fn is_no_match(&self) -> bool {
        matches!(self, ExecutionError::NoCompatibleOrders)
    }

    /// Returns true if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ExecutionError::InvalidAsset(_) | ExecutionError::PriceInconsistency { .. }
        )
    }

    /// Returns true if this is an internal error
    pub fn is_internal_error(&self) -> bool {
        matches!(
            self,
            ExecutionError::Persistence(_) | ExecutionError::FeeScheduleMissing(_)
        )
    }
}

impl From<ValidationError> for ExecutionError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Unavailable(what) => ExecutionError::InvalidAsset(what),
            ValidationError::Lookup(db) => ExecutionError::Persistence(db),
        }
    }
}
