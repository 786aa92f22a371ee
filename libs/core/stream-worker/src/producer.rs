//! Enqueuing side of a job stream.
//!
//! ```rust,ignore
//! let producer = StreamProducer::from_stream_def::<ProductStream>(redis);
//! let entry_id = producer.send(&RegisterProductJob::new(product)).await?;
//! ```

use crate::error::StreamResult;
use crate::registry::{MessageKey, StreamDef, StreamJob};
use redis::aio::ConnectionManager;
use tracing::debug;

const DEFAULT_MAX_LENGTH: i64 = 100_000;

/// Appends jobs as `job` fields, trimming the stream to roughly `max_length`.
#[derive(Clone)]
pub struct StreamProducer {
    redis: ConnectionManager,
    stream_name: String,
    max_length: i64,
}

impl StreamProducer {
    pub fn new(redis: ConnectionManager, stream_name: impl Into<String>) -> Self {
        Self {
            redis,
            stream_name: stream_name.into(),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Targets the same stream, with the same trimming, as a worker built
    /// from `S`.
    pub fn from_stream_def<S: StreamDef>(redis: ConnectionManager) -> Self {
        Self::new(redis, S::STREAM_NAME).with_max_length(S::MAX_LENGTH)
    }

    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// `XADD <stream> MAXLEN ~ <n> * job <json>`; returns the entry id.
    pub async fn send<J: StreamJob>(&self, job: &J) -> StreamResult<String> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.redis.clone();

        let entry_id: String = redis::cmd("XADD")
            .arg(&self.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg(MessageKey::Job.as_ref())
            .arg(payload)
            .query_async(&mut conn)
            .await?;

        debug!(
            stream = %self.stream_name,
            entry_id = %entry_id,
            job_id = %job.job_id(),
            retry_count = job.retry_count(),
            "Enqueued job"
        );
        Ok(entry_id)
    }
}
