//! The generic `StreamWorker` loop and its failure policy.

use crate::config::WorkerConfig;
use crate::consumer::StreamConsumer;
use crate::dlq::DlqManager;
use crate::error::{ErrorCategory, StreamError};
use crate::event::{MalformedEntry, StreamEvent, StreamMessage};
use crate::producer::StreamProducer;
use crate::registry::{StreamJob, StreamProcessor};
use redis::aio::ConnectionManager;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Pause after a failed read before polling Redis again.
const READ_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// What to do with a job whose processing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Wait `delay`, re-enqueue a copy with `retry_count + 1`, ack the original.
    Retry { delay: Duration },
    /// Write to the DLQ, ack the original.
    DeadLetter,
}

/// Permanent errors go straight to the DLQ; transient ones are retried with
/// exponential backoff until `retry_count` reaches `max_retries`.
pub fn decide_disposition(error: &StreamError, retry_count: u32, max_retries: u32) -> Disposition {
    match error.category() {
        ErrorCategory::Permanent => Disposition::DeadLetter,
        ErrorCategory::Transient if retry_count >= max_retries => Disposition::DeadLetter,
        ErrorCategory::Transient => Disposition::Retry {
            delay: Duration::from_millis(error.backoff_delay_ms(retry_count)),
        },
    }
}

/// Generic stream worker that processes jobs using a processor.
///
/// Entries are handled one at a time. An entry is acknowledged only once it
/// has been processed, dead-lettered or re-enqueued, so a crash in between
/// leaves it pending; pending entries are re-read on the next start.
pub struct StreamWorker<J, P>
where
    J: StreamJob,
    P: StreamProcessor<J>,
{
    consumer: StreamConsumer,
    producer: StreamProducer,
    dlq: DlqManager,
    processor: Arc<P>,
    config: WorkerConfig,
    _phantom: PhantomData<J>,
}

impl<J, P> StreamWorker<J, P>
where
    J: StreamJob + 'static,
    P: StreamProcessor<J> + 'static,
{
    pub fn new(redis: ConnectionManager, processor: P, config: WorkerConfig) -> Self {
        Self::with_arc_processor(redis, Arc::new(processor), config)
    }

    pub fn with_arc_processor(
        redis: ConnectionManager,
        processor: Arc<P>,
        config: WorkerConfig,
    ) -> Self {
        let producer = StreamProducer::new(redis.clone(), config.stream_name.clone())
            .with_max_length(config.max_length);
        let dlq = DlqManager::new(redis.clone(), config.dlq_stream.clone())
            .with_max_length(config.dlq_max_length);
        let consumer = StreamConsumer::new(redis, config.clone());

        Self {
            consumer,
            producer,
            dlq,
            processor,
            config,
            _phantom: PhantomData,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run until `shutdown` becomes `true` (or its sender is dropped).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StreamError> {
        info!(
            consumer_id = %self.config.consumer_id,
            stream = %self.config.stream_name,
            group = %self.config.consumer_group,
            dlq = %self.config.dlq_stream,
            processor = %self.processor.name(),
            max_retries = self.config.max_retries,
            "Starting stream worker"
        );

        self.consumer.init_consumer_group().await?;
        self.recover_pending(&mut shutdown).await?;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            let read = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown channel closed, stopping worker");
                        break;
                    }
                    continue;
                }
                read = self.consumer.read_new::<J>() => read,
            };

            match read {
                Ok(messages) => {
                    for message in messages {
                        self.handle_message(message, &mut shutdown).await;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to read from stream");
                    if sleep_or_shutdown(READ_ERROR_BACKOFF, &mut shutdown).await {
                        break;
                    }
                }
            }
        }

        info!("Stream worker stopped");
        Ok(())
    }

    /// Re-read entries this consumer received but never acknowledged.
    async fn recover_pending(&self, shutdown: &mut watch::Receiver<bool>) -> Result<(), StreamError> {
        let mut cursor = "0".to_string();
        let mut recovered = 0usize;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let messages = self.consumer.read_pending::<J>(&cursor).await?;
            let Some(last) = messages.last() else {
                break;
            };
            cursor = last.stream_id().to_string();
            recovered += messages.len();

            for message in messages {
                self.handle_message(message, shutdown).await;
            }
        }

        if recovered > 0 {
            info!(count = recovered, "Recovered pending messages");
        }
        Ok(())
    }

    /// Settle one entry. Failures to settle are logged; the entry then stays
    /// pending and is retried on the next start.
    async fn handle_message(&self, message: StreamMessage<J>, shutdown: &mut watch::Receiver<bool>) {
        let stream_id = message.stream_id().to_string();

        let result = match message {
            StreamMessage::Job(event) => self.handle_job(event, shutdown).await,
            StreamMessage::Malformed(entry) => self.handle_malformed(&entry).await,
        };

        match result {
            Ok(()) => {}
            Err(StreamError::Shutdown) => {
                debug!(stream_id = %stream_id, "Shutdown during backoff, leaving message pending");
            }
            Err(e) => {
                error!(stream_id = %stream_id, error = %e, "Failed to settle message, leaving it pending");
            }
        }
    }

    async fn handle_job(
        &self,
        event: StreamEvent<J>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), StreamError> {
        debug!(
            stream_id = %event.stream_id,
            job_id = %event.job_id(),
            retry_count = event.retry_count(),
            "Processing job"
        );

        let error = match self.processor.process(&event.job).await {
            Ok(()) => {
                debug!(job_id = %event.job_id(), "Job processed");
                return self.consumer.ack(&event.stream_id).await;
            }
            Err(e) => e,
        };

        let disposition =
            decide_disposition(&error, event.retry_count(), self.config.max_retries);

        warn!(
            stream_id = %event.stream_id,
            job_id = %event.job_id(),
            error = %error,
            category = ?error.category(),
            disposition = ?disposition,
            "Job processing failed"
        );

        match disposition {
            Disposition::Retry { delay } => {
                if sleep_or_shutdown(delay, shutdown).await {
                    return Err(StreamError::Shutdown);
                }
                let retry_id = self.producer.send(&event.job.with_retry()).await?;
                debug!(job_id = %event.job_id(), retry_id = %retry_id, "Re-enqueued job");
            }
            Disposition::DeadLetter => {
                self.dlq
                    .move_to_dlq(&event.job, &error.to_string(), &event.stream_id)
                    .await?;
            }
        }

        self.consumer.ack(&event.stream_id).await
    }

    async fn handle_malformed(&self, entry: &MalformedEntry) -> Result<(), StreamError> {
        self.dlq.move_raw_to_dlq(entry).await?;
        self.consumer.ack(&entry.stream_id).await
    }
}

/// Sleeps for `delay`; returns `true` if shutdown was requested meanwhile.
async fn sleep_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }

    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_error_goes_to_dlq() {
        let error = StreamError::permanent("capacity exceeded");
        assert_eq!(decide_disposition(&error, 0, 3), Disposition::DeadLetter);
    }

    #[test]
    fn test_transient_error_retries_with_backoff() {
        let error = StreamError::transient("connection reset");
        assert_eq!(
            decide_disposition(&error, 0, 3),
            Disposition::Retry {
                delay: Duration::from_secs(1)
            }
        );
        assert_eq!(
            decide_disposition(&error, 2, 3),
            Disposition::Retry {
                delay: Duration::from_secs(4)
            }
        );
    }

    #[test]
    fn test_transient_error_dead_letters_after_max_retries() {
        let error = StreamError::transient("connection reset");
        assert_eq!(decide_disposition(&error, 3, 3), Disposition::DeadLetter);
        assert_eq!(decide_disposition(&error, 0, 0), Disposition::DeadLetter);
    }

    #[test]
    fn test_serialization_error_is_permanent() {
        let error = StreamError::Serialization("bad payload".to_string());
        assert_eq!(decide_disposition(&error, 0, 3), Disposition::DeadLetter);
    }

    #[tokio::test]
    async fn test_sleep_or_shutdown_interrupted() {
        let (tx, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            sleep_or_shutdown(Duration::from_secs(60), &mut rx).await
        });
        tx.send(true).unwrap();
        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_sleep_or_shutdown_elapses() {
        let (_tx, mut rx) = watch::channel(false);
        assert!(!sleep_or_shutdown(Duration::from_millis(5), &mut rx).await);
    }
}
