//! Stream definitions and the job/processor contracts.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use strum::{AsRefStr, Display};

use crate::error::StreamError;

/// Field names used in stream entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MessageKey {
    /// The job payload (JSON) on the work stream.
    Job,
    /// The [`DlqEntry`](crate::DlqEntry) payload (JSON) on the DLQ stream.
    Data,
}

/// Stream definition trait.
///
/// Each domain implements this trait to name its stream, consumer group and
/// dead letter queue.
///
/// ```rust,ignore
/// pub struct ProductStream;
///
/// impl StreamDef for ProductStream {
///     const STREAM_NAME: &'static str = "products:register";
///     const CONSUMER_GROUP: &'static str = "products_workers";
///     const DLQ_STREAM: &'static str = "products:dlq";
/// }
/// ```
pub trait StreamDef: Send + Sync {
    /// The Redis stream name.
    const STREAM_NAME: &'static str;

    /// The consumer group name for this stream.
    const CONSUMER_GROUP: &'static str;

    /// The dead letter queue stream name for failed jobs.
    const DLQ_STREAM: &'static str;

    /// Approximate maximum stream length (`MAXLEN ~`).
    const MAX_LENGTH: i64 = 100_000;

    /// Approximate maximum DLQ length.
    const DLQ_MAX_LENGTH: i64 = 10_000;

    fn stream_name() -> &'static str {
        Self::STREAM_NAME
    }

    fn consumer_group() -> &'static str {
        Self::CONSUMER_GROUP
    }

    fn dlq_stream() -> &'static str {
        Self::DLQ_STREAM
    }
}

/// Trait for stream job payloads.
///
/// The retry count travels with the job: a retried job is re-enqueued as a
/// fresh entry produced by [`StreamJob::with_retry`].
pub trait StreamJob: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the job ID for logging and tracking.
    fn job_id(&self) -> String;

    /// Returns the current retry count.
    fn retry_count(&self) -> u32;

    /// Creates a copy with the retry count incremented.
    fn with_retry(&self) -> Self;

    /// Check if the job has used up `max_retries`.
    fn exceeded_max_retries(&self, max_retries: u32) -> bool {
        self.retry_count() >= max_retries
    }
}

/// Trait for job processors.
///
/// Return `Ok(())` once the job is done. Errors are categorised through
/// [`StreamError::category`] to decide between a retry and the DLQ.
#[async_trait]
pub trait StreamProcessor<J: StreamJob>: Send + Sync {
    /// Process a single job.
    async fn process(&self, job: &J) -> Result<(), StreamError>;

    /// Processor name for logging.
    fn name(&self) -> &'static str;
}
