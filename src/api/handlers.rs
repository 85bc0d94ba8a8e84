use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::collaborators::BlockedUserCache;
use crate::engine::{ExecutionError, OrderExecutionEngine};
use crate::models::ExecutionOutcome;
use crate::rabbitmq::RabbitMQPublisher;

use super::responses::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<OrderExecutionEngine>,
    pub blocked: BlockedUserCache,
    /// Broker used for side effects; `None` when running without one
    pub publisher: Option<Arc<RabbitMQPublisher>>,
}

/// Convert ExecutionError to HTTP response
impl IntoResponse for ExecutionError {
    fn into_response(self) -> Response {
        let status = if self.is_no_match() {
            StatusCode::NOT_FOUND
        } else if self.is_validation_error() {
            StatusCode::BAD_REQUEST
        } else if self.is_internal_error() {
            tracing::error!("Execution failed: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            // Order changed under the run
            StatusCode::CONFLICT
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let broker_connected = match &state.publisher {
        Some(publisher) => publisher.is_connected().await,
        None => false,
    };

    Json(HealthResponse {
        status: if broker_connected { "healthy" } else { "degraded" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        blocked_users: state.blocked.len(),
        broker_connected,
    })
}

/// Execute an order against the resting counter-orders
#[utoipa::path(
    post,
    path = "/api/v1/orders/{identificator}/execute",
    tag = "Orders",
    params(
        ("identificator" = String, Path, description = "Public order identificator")
    ),
    responses(
        (status = 200, description = "Order executed", body = ExecutionOutcome),
        (status = 404, description = "No compatible orders", body = ErrorResponse),
        (status = 409, description = "Order taken by another run", body = ErrorResponse),
        (status = 400, description = "Invalid market or prices", body = ErrorResponse),
        (status = 500, description = "Store or fee schedule failure", body = ErrorResponse)
    )
)]
pub async fn execute_order(
    State(state): State<AppState>,
    Path(identificator): Path<String>,
) -> Result<Json<ExecutionOutcome>, ExecutionError> {
    let outcome = state.engine.execute(&identificator).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseError;
    use rust_decimal_macros::dec;

    fn status_of(err: ExecutionError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(status_of(ExecutionError::NoCompatibleOrders), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ExecutionError::OrderUnavailable("ord-1".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ExecutionError::InvalidAsset("Pair eth_brl".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ExecutionError::PriceInconsistency {
                identified_id: 1,
                identified_price: dec!(100),
                candidate_id: 2,
                candidate_price: dec!(101),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ExecutionError::FeeScheduleMissing("btcbrl".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ExecutionError::Persistence(DatabaseError::QueryError(
                "timeout".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
