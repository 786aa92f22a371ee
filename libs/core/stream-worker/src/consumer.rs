//! Stream consumer for Redis operations
//!
//! Reads entries through a consumer group and acknowledges them.

use crate::config::WorkerConfig;
use crate::error::StreamError;
use crate::event::{MalformedEntry, StreamEvent, StreamMessage};
use crate::registry::{MessageKey, StreamJob};
use redis::RedisResult;
use redis::aio::ConnectionManager;
use tracing::{debug, info, warn};

/// Field/value pairs of one entry. `None` for entries deleted while pending.
type EntryFields = Option<Vec<(String, String)>>;

/// `(stream_id, fields)` pairs as returned by XREADGROUP for one stream.
pub type StreamEntries = Vec<(String, EntryFields)>;

type ReadReply = Option<Vec<(String, StreamEntries)>>;

/// Stream consumer for Redis operations
pub struct StreamConsumer {
    redis: ConnectionManager,
    config: WorkerConfig,
}

impl StreamConsumer {
    pub fn new(redis: ConnectionManager, config: WorkerConfig) -> Self {
        Self { redis, config }
    }

    pub fn stream_name(&self) -> &str {
        &self.config.stream_name
    }

    pub fn consumer_group(&self) -> &str {
        &self.config.consumer_group
    }

    pub fn consumer_id(&self) -> &str {
        &self.config.consumer_id
    }

    /// Create the consumer group (and the stream) if it doesn't exist.
    pub async fn init_consumer_group(&self) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let result: RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => {
                info!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Created consumer group"
                );
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Consumer group already exists"
                );
            }
            Err(e) => return Err(StreamError::Redis(e)),
        }

        Ok(())
    }

    /// Read entries delivered to this consumer but never acknowledged, with
    /// IDs greater than `after` ("0" for the start of the pending list).
    pub async fn read_pending<J: StreamJob>(
        &self,
        after: &str,
    ) -> Result<Vec<StreamMessage<J>>, StreamError> {
        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id)
            .arg("COUNT")
            .arg(self.config.batch_size)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(after);

        self.read(cmd).await
    }

    /// Block up to the configured timeout for entries never delivered to
    /// any consumer of the group.
    pub async fn read_new<J: StreamJob>(&self) -> Result<Vec<StreamMessage<J>>, StreamError> {
        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id)
            .arg("COUNT")
            .arg(self.config.batch_size)
            .arg("BLOCK")
            .arg(self.config.block_timeout_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">");

        self.read(cmd).await
    }

    async fn read<J: StreamJob>(
        &self,
        cmd: redis::Cmd,
    ) -> Result<Vec<StreamMessage<J>>, StreamError> {
        let mut conn = self.redis.clone();
        let result: RedisResult<ReadReply> = cmd.query_async(&mut conn).await;

        match result {
            Ok(Some(streams)) => Ok(streams
                .into_iter()
                .flat_map(|(_stream, entries)| parse_entries(entries))
                .collect()),
            // BLOCK timed out
            Ok(None) => Ok(vec![]),
            Err(e) if e.to_string().contains("NOGROUP") => {
                warn!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Consumer group missing, recreating"
                );
                self.init_consumer_group().await?;
                Ok(vec![])
            }
            Err(e) => Err(StreamError::Redis(e)),
        }
    }

    /// Acknowledge an entry, removing it from the pending list.
    pub async fn ack(&self, stream_id: &str) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let _: i64 = redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(stream_id)
            .query_async(&mut conn)
            .await?;

        debug!(stream_id = %stream_id, "Acknowledged message");
        Ok(())
    }
}

/// Decode raw entries. Entries without a decodable `job` field become
/// [`StreamMessage::Malformed`] instead of being skipped.
pub fn parse_entries<J: StreamJob>(entries: StreamEntries) -> Vec<StreamMessage<J>> {
    entries
        .into_iter()
        .map(|(stream_id, fields)| parse_entry(stream_id, fields))
        .collect()
}

fn parse_entry<J: StreamJob>(stream_id: String, fields: EntryFields) -> StreamMessage<J> {
    let Some(fields) = fields else {
        return StreamMessage::Malformed(MalformedEntry {
            stream_id,
            payload: None,
            error: "entry no longer exists in the stream".to_string(),
        });
    };

    let payload = fields
        .into_iter()
        .find(|(k, _)| k == MessageKey::Job.as_ref())
        .map(|(_, v)| v);

    let Some(json) = payload else {
        warn!(stream_id = %stream_id, "Missing 'job' field in message");
        return StreamMessage::Malformed(MalformedEntry {
            stream_id,
            payload: None,
            error: "missing 'job' field".to_string(),
        });
    };

    match serde_json::from_str::<J>(&json) {
        Ok(job) => StreamMessage::Job(StreamEvent::new(stream_id, job)),
        Err(e) => {
            warn!(stream_id = %stream_id, error = %e, "Failed to parse job");
            StreamMessage::Malformed(MalformedEntry {
                stream_id,
                payload: Some(json),
                error: e.to_string(),
            })
        }
    }
}
