//! Connectors for the stores behind the products services.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL through SeaORM
//! - `redis` (default) - Redis `ConnectionManager`
//! - `config` - `core_config::FromEnv` for the connection configs
//!
//! ```ignore
//! use database::{RetryConfig, postgres, redis};
//!
//! let db = postgres::connect_from_config_with_retry(PostgresConfig::from_env()?, None).await?;
//! let conn = redis::connect_with_retry("redis://127.0.0.1:6379", Some(RetryConfig::new())).await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;

pub use common::{DatabaseError, DatabaseResult, RetryConfig, retry_with_backoff};
