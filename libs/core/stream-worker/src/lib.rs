//! Stream Worker Framework
//!
//! A generic Redis Streams worker framework for processing background jobs.
//!
//! ## Features
//!
//! - **Generic worker**: `StreamWorker<J, P>` processes any job type
//! - **Consumer groups**: horizontal scaling with Redis consumer groups
//! - **At-least-once delivery**: entries are acknowledged only once they are
//!   handled, dead-lettered or re-enqueued
//! - **Dead Letter Queue**: permanent failures, exhausted retries and
//!   undecodable entries are moved to the DLQ stream
//!
//! ## Example
//!
//! ```ignore
//! use stream_worker::{StreamDef, StreamJob, StreamProcessor, StreamWorker, WorkerConfig};
//!
//! struct RegisterStream;
//! impl StreamDef for RegisterStream {
//!     const STREAM_NAME: &'static str = "products:register";
//!     const CONSUMER_GROUP: &'static str = "products_workers";
//!     const DLQ_STREAM: &'static str = "products:dlq";
//! }
//!
//! let config = WorkerConfig::from_env::<RegisterStream>()?;
//! let worker = StreamWorker::new(redis, processor, config);
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod consumer;
mod dlq;
mod error;
mod event;
mod producer;
mod registry;
mod worker;

pub use config::WorkerConfig;
pub use consumer::{StreamConsumer, parse_entries};
pub use dlq::{DlqEntry, DlqManager};
pub use error::{ErrorCategory, StreamError, StreamResult};
pub use event::{MalformedEntry, StreamEvent, StreamMessage};
pub use producer::StreamProducer;
pub use registry::{MessageKey, StreamDef, StreamJob, StreamProcessor};
pub use worker::{Disposition, StreamWorker, decide_disposition};
