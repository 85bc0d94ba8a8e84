pub mod collaborators;
pub mod config;
pub mod publisher;

pub use collaborators::{
    BlockAccountCommand, BridgeOrderCommand, FixOrderTotalCommand, RabbitMQCollaborators,
};
pub use config::{RabbitMQConfig, RoutingKeyBuilder};
pub use publisher::{RabbitMQError, RabbitMQPublisher};
