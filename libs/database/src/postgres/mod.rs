//! PostgreSQL connection management through SeaORM.

mod config;
mod connector;

pub use config::PostgresConfig;
pub use connector::{close, connect, connect_from_config, connect_from_config_with_retry};

pub use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
