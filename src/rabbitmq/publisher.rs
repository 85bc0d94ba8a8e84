use chrono::Utc;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::config::RabbitMQConfig;

/// Error types for RabbitMQ operations
#[derive(Debug, thiserror::Error)]
pub enum RabbitMQError {
    #[error("Connection error: {0}")]
    Connection(#[from] lapin::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Publisher not connected")]
    NotConnected,

    #[error("Connection timed out after {0}s")]
    Timeout(u64),

    #[error("Broker rejected {routing_key}: {reason}")]
    Rejected { routing_key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RabbitMQError>;

/// Open AMQP session: the connection and the channel commands go out on
struct Session {
    connection: Connection,
    channel: Channel,
}

/// Publishes collaborator commands as persistent JSON messages
///
/// Each message carries a fresh message id and the publish timestamp so
/// consumers can deduplicate redeliveries. With publisher confirms enabled a
/// publish only succeeds once the broker has acknowledged it.
pub struct RabbitMQPublisher {
    config: RabbitMQConfig,
    session: RwLock<Option<Session>>,
}

impl RabbitMQPublisher {
    pub fn new(config: RabbitMQConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
        }
    }

    /// Open the connection, declare the exchange and enable confirms
    pub async fn connect(&self) -> Result<()> {
        tracing::info!("Connecting to RabbitMQ exchange {}", self.config.exchange);

        let timeout = self.config.connection_timeout_secs;
        let connection = tokio::time::timeout(
            Duration::from_secs(timeout),
            Connection::connect(&self.config.uri, ConnectionProperties::default()),
        )
        .await
        .map_err(|_| RabbitMQError::Timeout(timeout))??;

        let channel = connection.create_channel().await?;
        channel
            .exchange_declare(
                &self.config.exchange,
                exchange_kind(&self.config.exchange_type),
                ExchangeDeclareOptions {
                    durable: self.config.durable,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        if self.config.publisher_confirms {
            channel
                .confirm_select(ConfirmSelectOptions::default())
                .await?;
        }

        *self.session.write().await = Some(Session {
            connection,
            channel,
        });

        tracing::info!("Connected to RabbitMQ (confirms: {})", self.config.publisher_confirms);
        Ok(())
    }

    /// Close the channel and connection if open
    pub async fn disconnect(&self) -> Result<()> {
        if let Some(session) = self.session.write().await.take() {
            session.channel.close(200, "Normal shutdown").await?;
            session.connection.close(200, "Normal shutdown").await?;
            tracing::info!("Disconnected from RabbitMQ");
        }
        Ok(())
    }

    /// Publish one command under `routing_key`
    pub async fn publish<T: Serialize>(&self, routing_key: &str, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        let session = self.session.read().await;
        let channel = match session.as_ref() {
            Some(session) if session.channel.status().connected() => &session.channel,
            _ => return Err(RabbitMQError::NotConnected),
        };

        let confirm = channel
            .basic_publish(
                &self.config.exchange,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                message_properties(),
            )
            .await?;

        if self.config.publisher_confirms {
            let confirmation = confirm.await?;
            if confirmation.is_nack() {
                return Err(RabbitMQError::Rejected {
                    routing_key: routing_key.to_string(),
                    reason: "negative acknowledgement".to_string(),
                });
            }
        }

        tracing::trace!("Published {} ({} bytes)", routing_key, payload.len());
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|session| session.channel.status().connected())
    }
}

/// Persistent JSON delivery with id and timestamp
fn message_properties() -> BasicProperties {
    BasicProperties::default()
        .with_content_type("application/json".into())
        .with_delivery_mode(2)
        .with_message_id(Uuid::new_v4().simple().to_string().into())
        .with_timestamp(Utc::now().timestamp() as u64)
}

fn exchange_kind(exchange_type: &str) -> ExchangeKind {
    match exchange_type.to_lowercase().as_str() {
        "direct" => ExchangeKind::Direct,
        "fanout" => ExchangeKind::Fanout,
        "headers" => ExchangeKind::Headers,
        _ => ExchangeKind::Topic,
    }
}
