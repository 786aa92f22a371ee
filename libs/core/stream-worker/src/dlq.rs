//! Dead Letter Queue (DLQ) management

use crate::error::StreamError;
use crate::event::MalformedEntry;
use crate::registry::{MessageKey, StreamJob};
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Writes failed jobs to the DLQ stream.
#[derive(Clone)]
pub struct DlqManager {
    redis: ConnectionManager,
    dlq_stream: String,
    max_length: i64,
}

impl DlqManager {
    pub fn new(redis: ConnectionManager, dlq_stream: impl Into<String>) -> Self {
        Self {
            redis,
            dlq_stream: dlq_stream.into(),
            max_length: 10_000,
        }
    }

    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn dlq_stream(&self) -> &str {
        &self.dlq_stream
    }

    /// Move a decoded job to the dead letter queue.
    pub async fn move_to_dlq<J: StreamJob>(
        &self,
        job: &J,
        error: &str,
        original_stream_id: &str,
    ) -> Result<String, StreamError> {
        let entry = DlqEntry::for_job(job, error, original_stream_id)?;
        self.push(&entry).await
    }

    /// Move an entry that never decoded into a job, keeping its raw payload.
    pub async fn move_raw_to_dlq(&self, entry: &MalformedEntry) -> Result<String, StreamError> {
        self.push(&DlqEntry::for_malformed(entry)).await
    }

    async fn push(&self, entry: &DlqEntry) -> Result<String, StreamError> {
        let data = serde_json::to_string(entry)?;
        let mut conn = self.redis.clone();

        let dlq_id: String = redis::cmd("XADD")
            .arg(&self.dlq_stream)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg(MessageKey::Data.as_ref())
            .arg(&data)
            .query_async(&mut conn)
            .await?;

        warn!(
            job_id = ?entry.job_id,
            dlq_id = %dlq_id,
            original_stream_id = %entry.original_stream_id,
            error = %entry.error,
            retry_count = entry.retry_count,
            "Moved job to DLQ"
        );

        Ok(dlq_id)
    }
}

/// Payload of a DLQ stream entry (field `data`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DlqEntry {
    /// Original job ID, absent when the entry never decoded
    pub job_id: Option<String>,

    /// The job as JSON, or the raw payload string for undecodable entries
    pub job_data: serde_json::Value,

    /// Error message that caused the failure
    pub error: String,

    /// Original stream entry ID
    pub original_stream_id: String,

    /// Number of retry attempts
    pub retry_count: u32,

    /// When the job was moved to DLQ
    pub failed_at: DateTime<Utc>,
}

impl DlqEntry {
    pub fn for_job<J: StreamJob>(
        job: &J,
        error: &str,
        original_stream_id: &str,
    ) -> Result<Self, StreamError> {
        Ok(Self {
            job_id: Some(job.job_id()),
            job_data: serde_json::to_value(job)?,
            error: error.to_string(),
            original_stream_id: original_stream_id.to_string(),
            retry_count: job.retry_count(),
            failed_at: Utc::now(),
        })
    }

    pub fn for_malformed(entry: &MalformedEntry) -> Self {
        Self {
            job_id: None,
            job_data: entry
                .payload
                .clone()
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
            error: entry.error.clone(),
            original_stream_id: entry.stream_id.clone(),
            retry_count: 0,
            failed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Serialize, Deserialize)]
    struct Job {
        id: String,
        retry_count: u32,
    }

    impl StreamJob for Job {
        fn job_id(&self) -> String {
            self.id.clone()
        }
        fn retry_count(&self) -> u32 {
            self.retry_count
        }
        fn with_retry(&self) -> Self {
            Self {
                id: self.id.clone(),
                retry_count: self.retry_count + 1,
            }
        }
    }

    #[test]
    fn test_entry_for_job() {
        let job = Job {
            id: "job-1".to_string(),
            retry_count: 3,
        };
        let entry = DlqEntry::for_job(&job, "storage unavailable", "1234567890123-0").unwrap();

        assert_eq!(entry.job_id.as_deref(), Some("job-1"));
        assert_eq!(entry.retry_count, 3);
        assert_eq!(entry.job_data["id"], "job-1");
        assert_eq!(entry.original_stream_id, "1234567890123-0");
    }

    #[test]
    fn test_entry_for_malformed_keeps_raw_payload() {
        let entry = DlqEntry::for_malformed(&MalformedEntry {
            stream_id: "5-0".to_string(),
            payload: Some("{not json".to_string()),
            error: "expected value".to_string(),
        });

        assert!(entry.job_id.is_none());
        assert_eq!(entry.job_data, serde_json::Value::String("{not json".to_string()));

        let json = serde_json::to_string(&entry).unwrap();
        let back: DlqEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.original_stream_id, "5-0");
    }
}
