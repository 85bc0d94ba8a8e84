use order_execution_core::collaborators::{BlockedUserCache, DbMarketValidator};
use order_execution_core::config::ServiceConfig;
use order_execution_core::database::{establish_connection_pool, repositories::*, DatabasePool};
use order_execution_core::engine::{ExecutionStores, OrderExecutionEngine};
use order_execution_core::rabbitmq::{RabbitMQCollaborators, RabbitMQPublisher};
use order_execution_core::side_effects::SideEffectWorker;
use order_execution_core::{create_router, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_execution_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;

    let pool = establish_connection_pool(&config.database_url, config.db_pool_max_size)?;
    if config.run_migrations {
        pool.run_migrations()?;
    }

    let publisher = Arc::new(RabbitMQPublisher::new(config.rabbitmq.clone()));
    if let Err(e) = publisher.connect().await {
        // Side effects are logged and dropped until the broker is reachable
        tracing::warn!("RabbitMQ unavailable, collaborator messages will fail: {}", e);
    }
    let collaborators = Arc::new(RabbitMQCollaborators::new(Arc::clone(&publisher)));

    let (side_effects, worker) = SideEffectWorker::new(
        collaborators.clone(),
        collaborators.clone(),
        collaborators,
    )
    .start();

    let blocked = BlockedUserCache::new();
    let coins: Arc<dyn CoinRepository> = {
        let pool = pool.clone();
        Arc::new(CoinRepositoryImpl::new(move || pool.get_conn()))
    };

    let engine = OrderExecutionEngine::new(
        stores(&pool),
        Arc::new(DbMarketValidator::new(coins)),
        Arc::new(blocked.clone()),
        side_effects,
    );

    let app = create_router(AppState {
        engine: Arc::new(engine),
        blocked,
        publisher: Some(Arc::clone(&publisher)),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("Order execution API running on http://{}", config.bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Router is gone: let the worker drain what is still queued
    worker.await?;
    publisher.disconnect().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

/// Diesel-backed stores sharing one connection pool
fn stores(pool: &DatabasePool) -> ExecutionStores {
    let orders = {
        let pool = pool.clone();
        Arc::new(OrderRepositoryImpl::new(move || pool.get_conn())) as Arc<dyn OrderRepository>
    };
    let executions = {
        let pool = pool.clone();
        Arc::new(ExecutionRepositoryImpl::new(move || pool.get_conn()))
            as Arc<dyn ExecutionRepository>
    };
    let ledger = {
        let pool = pool.clone();
        Arc::new(LedgerRepositoryImpl::new(move || pool.get_conn())) as Arc<dyn LedgerRepository>
    };
    let fees = {
        let pool = pool.clone();
        Arc::new(FeeRepositoryImpl::new(move || pool.get_conn())) as Arc<dyn FeeRepository>
    };

    ExecutionStores {
        orders,
        executions,
        ledger,
        fees,
    }
}
