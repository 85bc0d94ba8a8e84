use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::config::RoutingKeyBuilder;
use super::publisher::{RabbitMQError, RabbitMQPublisher};
use crate::collaborators::{AccountControl, CollaboratorError, NotificationQueue, OrderAggregation};
use crate::models::{EmailQueuePayload, Order};

/// Account freeze request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAccountCommand {
    pub user_id: i64,
}

/// Aggregate recomputation request for a filled order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOrderTotalCommand {
    pub order_id: i64,
    pub identificator: String,
    pub user_id: i64,
    pub pair: String,
}

impl From<&Order> for FixOrderTotalCommand {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            identificator: order.identificator.clone(),
            user_id: order.user.id,
            pair: order.pair.clone(),
        }
    }
}

/// Bridge mirroring request for an internal-account fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeOrderCommand {
    pub execution_record_id: i64,
    pub pair: String,
}

impl From<RabbitMQError> for CollaboratorError {
    fn from(err: RabbitMQError) -> Self {
        match err {
            RabbitMQError::Serialization(e) => CollaboratorError::Serialization(e),
            RabbitMQError::NotConnected => CollaboratorError::Unavailable(err.to_string()),
            other => CollaboratorError::Publish(other.to_string()),
        }
    }
}

/// Sibling-service adapters that publish commands to RabbitMQ
#[derive(Clone)]
pub struct RabbitMQCollaborators {
    publisher: Arc<RabbitMQPublisher>,
}

impl RabbitMQCollaborators {
    pub fn new(publisher: Arc<RabbitMQPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl AccountControl for RabbitMQCollaborators {
    async fn block_user_account(&self, user_id: i64) -> Result<(), CollaboratorError> {
        self.publisher
            .publish(&RoutingKeyBuilder::account_block(), &BlockAccountCommand { user_id })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationQueue for RabbitMQCollaborators {
    async fn save_email_queue(&self, payload: EmailQueuePayload) -> Result<(), CollaboratorError> {
        self.publisher
            .publish(&RoutingKeyBuilder::email_queue(), &payload)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderAggregation for RabbitMQCollaborators {
    async fn fix_order_total(&self, order: &Order) -> Result<(), CollaboratorError> {
        self.publisher
            .publish(
                &RoutingKeyBuilder::order_fix_total(),
                &FixOrderTotalCommand::from(order),
            )
            .await?;
        Ok(())
    }

    async fn insert_bridge_order(
        &self,
        execution_record_id: i64,
        pair: &str,
    ) -> Result<(), CollaboratorError> {
        let command = BridgeOrderCommand {
            execution_record_id,
            pair: pair.to_string(),
        };
        self.publisher
            .publish(&RoutingKeyBuilder::order_bridge(), &command)
            .await?;
        Ok(())
    }
}
