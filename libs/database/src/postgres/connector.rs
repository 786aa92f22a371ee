use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use super::PostgresConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryConfig, retry_with_backoff};

/// Connect with the default pool settings of [`PostgresConfig::new`].
pub async fn connect(database_url: &str) -> DatabaseResult<DatabaseConnection> {
    connect_from_config(PostgresConfig::new(database_url)).await
}

pub async fn connect_from_config(config: PostgresConfig) -> DatabaseResult<DatabaseConnection> {
    connect_with_options(config.into_connect_options()).await
}

async fn connect_with_options(options: ConnectOptions) -> DatabaseResult<DatabaseConnection> {
    let db = Database::connect(options).await?;
    info!("Successfully connected to PostgreSQL database");
    Ok(db)
}

/// Connect, retrying with exponential backoff (default [`RetryConfig`] if `None`).
///
/// Exhausted retries surface as [`DatabaseError::ConnectionFailed`].
pub async fn connect_from_config_with_retry(
    config: PostgresConfig,
    retry_config: Option<RetryConfig>,
) -> DatabaseResult<DatabaseConnection> {
    let retry_config = retry_config.unwrap_or_default();
    let attempts = retry_config.attempts();
    let options = config.into_connect_options();

    retry_with_backoff("postgres", &retry_config, || connect_with_options(options.clone()))
        .await
        .map_err(|e| {
            DatabaseError::ConnectionFailed(format!("PostgreSQL after {attempts} attempts: {e}"))
        })
}

/// Close the pool, waiting for checked-out connections to be returned.
pub async fn close(db: DatabaseConnection) -> DatabaseResult<()> {
    db.close().await?;
    info!("PostgreSQL connection pool closed");
    Ok(())
}
