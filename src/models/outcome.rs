use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One order leg of a completed match step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedOrderSummary {
    /// 1 when the order is now fully filled
    pub done: u8,
    pub order_identificator: String,
    /// Quantity filled by this step, sent as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 10.0)]
    pub amount: Decimal,
}

/// Result of a successful execution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    /// Public uid of the last counter-order owner visited
    pub counterpart_user_id: String,
    /// Public uid of the identified order's owner
    pub identified_user_id: String,
    /// Both legs of every step, in match order, identified leg first
    pub orders_executed: Vec<ExecutedOrderSummary>,
}
