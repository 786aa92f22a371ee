//! Acknowledgement ordering against a live Redis (`REDIS_URL`, default
//! redis://127.0.0.1:6379). Run with `cargo test -p stream-worker -- --ignored`.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use stream_worker::{
    StreamDef, StreamError, StreamJob, StreamProcessor, StreamProducer, StreamWorker, WorkerConfig,
};
use tokio::sync::{Notify, watch};
use uuid::Uuid;

struct RegisterStream;

impl StreamDef for RegisterStream {
    const STREAM_NAME: &'static str = "test:register";
    const CONSUMER_GROUP: &'static str = "test_workers";
    const DLQ_STREAM: &'static str = "test:register:dlq";
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RegisterJob {
    id: String,
    #[serde(default)]
    retry_count: u32,
}

impl StreamJob for RegisterJob {
    fn job_id(&self) -> String {
        self.id.clone()
    }

    fn retry_count(&self) -> u32 {
        self.retry_count
    }

    fn with_retry(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Succeed,
    Permanent,
    Transient,
}

/// Blocks inside `process` until the test releases it.
struct GatedProcessor {
    outcome: Outcome,
    entered: Notify,
    release: Notify,
}

impl GatedProcessor {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl StreamProcessor<RegisterJob> for GatedProcessor {
    async fn process(&self, _job: &RegisterJob) -> Result<(), StreamError> {
        self.entered.notify_one();
        self.release.notified().await;
        match self.outcome {
            Outcome::Succeed => Ok(()),
            Outcome::Permanent => Err(StreamError::permanent("capacity exceeded")),
            Outcome::Transient => Err(StreamError::transient("storage unavailable")),
        }
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

struct Harness {
    redis: ConnectionManager,
    config: WorkerConfig,
    processor: Arc<GatedProcessor>,
    shutdown: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<Result<(), StreamError>>,
}

impl Harness {
    async fn start(outcome: Outcome, max_retries: u32) -> Self {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let redis = ConnectionManager::new(redis::Client::open(url).unwrap())
            .await
            .unwrap();

        let suffix = Uuid::new_v4();
        let config = WorkerConfig {
            stream_name: format!("{}:{suffix}", RegisterStream::STREAM_NAME),
            dlq_stream: format!("{}:{suffix}", RegisterStream::DLQ_STREAM),
            ..WorkerConfig::from_stream_def::<RegisterStream>()
        }
        .with_block_timeout_ms(100)
        .with_max_retries(max_retries);

        StreamProducer::new(redis.clone(), config.stream_name.clone())
            .send(&RegisterJob {
                id: "job-1".to_string(),
                retry_count: 0,
            })
            .await
            .unwrap();

        let processor = GatedProcessor::new(outcome);
        let worker = StreamWorker::with_arc_processor(redis.clone(), Arc::clone(&processor), config.clone());
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { worker.run(rx).await });

        Self {
            redis,
            config,
            processor,
            shutdown,
            handle,
        }
    }

    async fn pending(&self) -> i64 {
        let mut conn = self.redis.clone();
        let reply: Vec<redis::Value> = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .query_async(&mut conn)
            .await
            .unwrap();
        match reply.first() {
            Some(redis::Value::Int(count)) => *count,
            other => panic!("unexpected XPENDING reply: {other:?}"),
        }
    }

    async fn len(&self, stream: &str) -> i64 {
        let mut conn = self.redis.clone();
        redis::cmd("XLEN").arg(stream).query_async(&mut conn).await.unwrap()
    }

    async fn wait_for_len(&self, stream: &str, expected: i64) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while self.len(stream).await != expected {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("{stream} never reached length {expected}"));
    }

    async fn wait_for_pending(&self, expected: i64) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while self.pending().await != expected {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("pending count never reached {expected}"));
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        self.handle.await.unwrap().unwrap();

        let mut conn = self.redis.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(&self.config.stream_name)
            .arg(&self.config.dlq_stream)
            .query_async(&mut conn)
            .await
            .unwrap();
    }
}

#[tokio::test]
#[ignore] // Requires a running Redis
async fn test_success_is_acked_after_processing() {
    let harness = Harness::start(Outcome::Succeed, 3).await;

    harness.processor.entered.notified().await;
    assert_eq!(harness.pending().await, 1);

    harness.processor.release.notify_one();
    harness.wait_for_pending(0).await;
    assert_eq!(harness.len(&harness.config.dlq_stream).await, 0);

    harness.stop().await;
}

#[tokio::test]
#[ignore] // Requires a running Redis
async fn test_permanent_failure_is_acked_only_after_dead_lettering() {
    let harness = Harness::start(Outcome::Permanent, 3).await;

    harness.processor.entered.notified().await;
    assert_eq!(harness.pending().await, 1);
    assert_eq!(harness.len(&harness.config.dlq_stream).await, 0);

    harness.processor.release.notify_one();
    harness.wait_for_len(&harness.config.dlq_stream, 1).await;
    harness.wait_for_pending(0).await;

    harness.stop().await;
}

#[tokio::test]
#[ignore] // Requires a running Redis
async fn test_transient_failure_is_requeued_then_dead_lettered() {
    let harness = Harness::start(Outcome::Transient, 1).await;

    // First attempt: a retry copy is appended before the original is acked.
    harness.processor.entered.notified().await;
    assert_eq!(harness.pending().await, 1);
    harness.processor.release.notify_one();
    harness.wait_for_len(&harness.config.stream_name, 2).await;

    // The copy carries retry_count 1 == max_retries, so it goes to the DLQ.
    harness.processor.entered.notified().await;
    harness.processor.release.notify_one();
    harness.wait_for_len(&harness.config.dlq_stream, 1).await;
    harness.wait_for_pending(0).await;

    harness.stop().await;
}
