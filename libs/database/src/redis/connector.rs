use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use super::RedisConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryConfig, retry_with_backoff};

/// Open a `ConnectionManager` and verify it with `PING`.
///
/// The manager reconnects on its own after the initial connection.
pub async fn connect(url: &str) -> DatabaseResult<ConnectionManager> {
    info!("Attempting to connect to Redis");

    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    let mut conn = manager.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    info!("Successfully connected to Redis");
    Ok(manager)
}

/// [`connect`] with exponential backoff (default [`RetryConfig`] if `None`).
pub async fn connect_with_retry(
    url: &str,
    retry_config: Option<RetryConfig>,
) -> DatabaseResult<ConnectionManager> {
    let retry_config = retry_config.unwrap_or_default();
    let attempts = retry_config.attempts();

    retry_with_backoff("redis", &retry_config, || connect(url))
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(format!("Redis after {attempts} attempts: {e}")))
}

pub async fn connect_from_config_with_retry(
    config: &RedisConfig,
    retry_config: Option<RetryConfig>,
) -> DatabaseResult<ConnectionManager> {
    connect_with_retry(config.url(), retry_config).await
}
