//! Contracts of the sibling services the execution core talks to
//!
//! The core never owns these concerns. It validates markets, freezes
//! accounts, queues emails and fixes order aggregates through the traits
//! below; production wiring uses [`DbMarketValidator`] and the RabbitMQ
//! adapters, tests use the recording doubles in `crate::testing`.

use crate::database::repositories::CoinRepository;
use crate::database::DatabaseError;
use crate::models::{CoinInfo, EmailQueuePayload, Order};
use async_trait::async_trait;
use dashmap::DashSet;
use std::sync::Arc;
use thiserror::Error;

/// Market validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} is not available")]
    Unavailable(String),

    #[error("Market lookup failed: {0}")]
    Lookup(#[from] DatabaseError),
}

/// Errors raised by fire-and-forget collaborators
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Pair and coin availability checks
#[async_trait]
pub trait MarketValidator: Send + Sync {
    /// Check that a pair (`btc_brl` form) is open for trading
    async fn validate_pair_available(&self, pair_key: &str) -> Result<(), ValidationError>;

    /// Check that a coin is listed and return its metadata
    async fn validate_coin_available(&self, coin: &str) -> Result<CoinInfo, ValidationError>;
}

/// Account freeze service
#[async_trait]
pub trait AccountControl: Send + Sync {
    async fn block_user_account(&self, user_id: i64) -> Result<(), CollaboratorError>;
}

/// Outgoing email queue
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn save_email_queue(&self, payload: EmailQueuePayload) -> Result<(), CollaboratorError>;
}

/// Order aggregate maintenance and bridge mirroring
#[async_trait]
pub trait OrderAggregation: Send + Sync {
    /// Recompute stored totals of an order that just became done
    async fn fix_order_total(&self, order: &Order) -> Result<(), CollaboratorError>;

    /// Mirror an internal-account fill to the external liquidity bridge
    async fn insert_bridge_order(
        &self,
        execution_record_id: i64,
        pair: &str,
    ) -> Result<(), CollaboratorError>;
}

/// Best-effort lookup of users whose accounts are frozen
pub trait BlockedUsers: Send + Sync {
    fn is_blocked(&self, user_id: i64) -> bool;

    fn mark_blocked(&self, user_id: i64);
}

// ============================================================================
// Blocked User Cache
// ============================================================================

/// In-process cache of frozen accounts
///
/// Entries are added by failure compensation and consulted by the finder so
/// a frozen user's resting orders are skipped without waiting for the
/// account service.
#[derive(Debug, Default, Clone)]
pub struct BlockedUserCache {
    blocked: Arc<DashSet<i64>>,
}

impl BlockedUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}

impl BlockedUsers for BlockedUserCache {
    fn is_blocked(&self, user_id: i64) -> bool {
        self.blocked.contains(&user_id)
    }

    fn mark_blocked(&self, user_id: i64) {
        if self.blocked.insert(user_id) {
            tracing::info!("User {} flagged as blocked", user_id);
        }
    }
}

// ============================================================================
// Database Market Validator
// ============================================================================

/// Market validator backed by the `coins` and `pairs` tables
pub struct DbMarketValidator {
    coins: Arc<dyn CoinRepository>,
}

impl DbMarketValidator {
    pub fn new(coins: Arc<dyn CoinRepository>) -> Self {
        Self { coins }
    }
}

#[async_trait]
impl MarketValidator for DbMarketValidator {
    async fn validate_pair_available(&self, pair_key: &str) -> Result<(), ValidationError> {
        if self.coins.is_pair_active(pair_key)? {
            Ok(())
        } else {
            Err(ValidationError::Unavailable(format!("Pair {}", pair_key)))
        }
    }

    async fn validate_coin_available(&self, coin: &str) -> Result<CoinInfo, ValidationError> {
        self.coins
            .find_active_coin(coin)?
            .ok_or_else(|| ValidationError::Unavailable(format!("Coin {}", coin)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryExchange;

    #[test]
    fn test_blocked_user_cache() {
        let cache = BlockedUserCache::new();
        assert!(!cache.is_blocked(7));

        cache.mark_blocked(7);
        cache.mark_blocked(7);

        assert!(cache.is_blocked(7));
        assert!(!cache.is_blocked(8));
        assert_eq!(cache.len(), 1);

        // Clones share the same set
        let shared = cache.clone();
        shared.mark_blocked(8);
        assert!(cache.is_blocked(8));
    }

    #[tokio::test]
    async fn test_db_market_validator() {
        let exchange = InMemoryExchange::with_btc_brl();
        let validator = DbMarketValidator::new(Arc::new(exchange.clone()));

        assert!(validator.validate_pair_available("btc_brl").await.is_ok());
        assert!(matches!(
            validator.validate_pair_available("eth_brl").await,
            Err(ValidationError::Unavailable(_))
        ));

        let brl = validator.validate_coin_available("BRL").await.unwrap();
        assert!(brl.fiat_pegged);
        assert_eq!(brl.currency_symbol, "R$");

        let err = validator.validate_coin_available("DOGE").await.unwrap_err();
        assert_eq!(err.to_string(), "Coin DOGE is not available");
    }
}
