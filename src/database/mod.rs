/// Database module for the exchange PostgreSQL store
///
/// This module provides:
/// - Connection pooling and embedded migrations
/// - Repository traits with diesel implementations
/// - Row models and the diesel schema

pub mod connection;
pub mod models;
pub mod repositories;
pub mod schema;

pub use connection::{establish_connection_pool, DatabaseError, DatabasePool};
