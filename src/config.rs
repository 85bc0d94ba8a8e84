//! Service configuration read from the environment

use std::env;
use thiserror::Error;

use crate::rabbitmq::RabbitMQConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings of the execution service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_url: String,
    pub db_pool_max_size: u32,
    pub bind_addr: String,
    pub run_migrations: bool,
    pub rabbitmq: RabbitMQConfig,
}

impl ServiceConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let db_pool_max_size = match lookup("DB_POOL_MAX_SIZE") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "DB_POOL_MAX_SIZE",
                value,
            })?,
            None => 10,
        };

        let run_migrations = match lookup("RUN_MIGRATIONS") {
            Some(value) => parse_flag(&value).ok_or(ConfigError::Invalid {
                name: "RUN_MIGRATIONS",
                value,
            })?,
            None => true,
        };

        let mut rabbitmq = RabbitMQConfig::default();
        if let Some(uri) = lookup("RABBITMQ_URI") {
            rabbitmq.uri = uri;
        }
        if let Some(exchange) = lookup("RABBITMQ_EXCHANGE") {
            rabbitmq.exchange = exchange;
        }

        Ok(Self {
            database_url,
            db_pool_max_size,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            run_migrations,
            rabbitmq,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ServiceConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/exchange")]))
                .unwrap();

        assert_eq!(config.db_pool_max_size, 10);
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert!(config.run_migrations);
        assert_eq!(config.rabbitmq.exchange, "exchange.core");
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/exchange"),
            ("DB_POOL_MAX_SIZE", "4"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("RUN_MIGRATIONS", "false"),
            ("RABBITMQ_URI", "amqp://rabbit:5672/%2F"),
            ("RABBITMQ_EXCHANGE", "exchange.test"),
        ]))
        .unwrap();

        assert_eq!(config.db_pool_max_size, 4);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(!config.run_migrations);
        assert_eq!(config.rabbitmq.uri, "amqp://rabbit:5672/%2F");
        assert_eq!(config.rabbitmq.exchange, "exchange.test");
    }

    #[test]
    fn test_missing_database_url() {
        let err = ServiceConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "Missing environment variable DATABASE_URL");
    }

    #[test]
    fn test_invalid_pool_size() {
        let err = ServiceConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/exchange"),
            ("DB_POOL_MAX_SIZE", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_POOL_MAX_SIZE", .. }));
    }
}
