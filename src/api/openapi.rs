use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::responses::*;
use crate::models::{ExecutedOrderSummary, ExecutionOutcome};

/// OpenAPI v1 specification
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Order Execution API",
        version = "1.0.0",
        description = "Matching and settlement core of the exchange"
    ),
    paths(
        handlers::health_check,
        handlers::execute_order,
    ),
    components(
        schemas(
            ExecutionOutcome,
            ExecutedOrderSummary,
            HealthResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Orders", description = "Order execution endpoints"),
    )
)]
pub struct ApiDocV1;
