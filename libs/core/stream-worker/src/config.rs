//! Worker configuration

use crate::registry::StreamDef;
use core_config::{ConfigError, env_or_default, env_parse};
use uuid::Uuid;

/// Configuration for the stream worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Redis stream name
    pub stream_name: String,

    /// Consumer group name
    pub consumer_group: String,

    /// Unique consumer ID within the group
    pub consumer_id: String,

    /// Dead letter queue stream name
    pub dlq_stream: String,

    /// Approximate stream length kept by re-enqueued retries
    pub max_length: i64,

    /// Approximate DLQ length
    pub dlq_max_length: i64,

    /// Entries read per XREADGROUP call
    pub batch_size: usize,

    /// XREADGROUP BLOCK timeout in milliseconds
    pub block_timeout_ms: u64,

    /// Retries allowed for transient failures before the job is dead-lettered
    pub max_retries: u32,
}

impl WorkerConfig {
    /// Create a new WorkerConfig from a StreamDef
    pub fn from_stream_def<S: StreamDef>() -> Self {
        Self {
            stream_name: S::STREAM_NAME.to_string(),
            consumer_group: S::CONSUMER_GROUP.to_string(),
            consumer_id: generate_consumer_id(),
            dlq_stream: S::DLQ_STREAM.to_string(),
            max_length: S::MAX_LENGTH,
            dlq_max_length: S::DLQ_MAX_LENGTH,
            batch_size: 10,
            block_timeout_ms: 5000,
            max_retries: 3,
        }
    }

    /// [`from_stream_def`](Self::from_stream_def) with overrides from
    /// `WORKER_BATCH_SIZE`, `WORKER_BLOCK_TIMEOUT_MS`, `WORKER_MAX_RETRIES`
    /// and `WORKER_CONSUMER_ID`.
    pub fn from_env<S: StreamDef>() -> Result<Self, ConfigError> {
        let defaults = Self::from_stream_def::<S>();

        let batch_size: usize = env_parse("WORKER_BATCH_SIZE", &defaults.batch_size.to_string())?;
        if batch_size == 0 {
            return Err(ConfigError::ParseError {
                key: "WORKER_BATCH_SIZE".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            batch_size,
            block_timeout_ms: env_parse(
                "WORKER_BLOCK_TIMEOUT_MS",
                &defaults.block_timeout_ms.to_string(),
            )?,
            max_retries: env_parse("WORKER_MAX_RETRIES", &defaults.max_retries.to_string())?,
            consumer_id: env_or_default("WORKER_CONSUMER_ID", &defaults.consumer_id),
            ..defaults
        })
    }

    pub fn with_consumer_id(mut self, id: impl Into<String>) -> Self {
        self.consumer_id = id.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_block_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.block_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

fn generate_consumer_id() -> String {
    format!("worker-{}", Uuid::new_v4())
}
