//! Stream event wrapper
//!
//! Wraps a job with its stream metadata (ID, timestamp).

use crate::registry::StreamJob;
use chrono::{DateTime, Utc};

/// A decoded stream entry.
#[derive(Debug, Clone)]
pub struct StreamEvent<J: StreamJob> {
    /// Redis stream entry ID (e.g., "1234567890123-0")
    pub stream_id: String,

    /// The job payload
    pub job: J,

    /// When the entry was added (parsed from the stream ID)
    pub timestamp: DateTime<Utc>,
}

impl<J: StreamJob> StreamEvent<J> {
    pub fn new(stream_id: String, job: J) -> Self {
        let timestamp = parse_timestamp(&stream_id);
        Self {
            stream_id,
            job,
            timestamp,
        }
    }

    pub fn job_id(&self) -> String {
        self.job.job_id()
    }

    pub fn retry_count(&self) -> u32 {
        self.job.retry_count()
    }

    /// Milliseconds since the entry was added.
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.timestamp).num_milliseconds()
    }
}

/// An entry that could not be decoded into a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedEntry {
    pub stream_id: String,
    /// Raw `job` field, if the entry had one
    pub payload: Option<String>,
    pub error: String,
}

/// What a single entry read from the stream turned out to be.
#[derive(Debug, Clone)]
pub enum StreamMessage<J: StreamJob> {
    Job(StreamEvent<J>),
    Malformed(MalformedEntry),
}

impl<J: StreamJob> StreamMessage<J> {
    pub fn stream_id(&self) -> &str {
        match self {
            StreamMessage::Job(event) => &event.stream_id,
            StreamMessage::Malformed(entry) => &entry.stream_id,
        }
    }
}

/// Stream IDs are "timestamp_ms-sequence".
fn parse_timestamp(stream_id: &str) -> DateTime<Utc> {
    stream_id
        .split('-')
        .next()
        .and_then(|ts| ts.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_else(Utc::now)
}
