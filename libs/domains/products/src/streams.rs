//! Register-product message flow over Redis Streams.

use serde::{Deserialize, Serialize};
use stream_worker::{StreamDef, StreamJob};
use uuid::Uuid;

use crate::models::NewProduct;

/// Stream carrying product registrations from producers to workers.
pub struct ProductStream;

impl StreamDef for ProductStream {
    const STREAM_NAME: &'static str = "products:register";

    const CONSUMER_GROUP: &'static str = "products_workers";

    const DLQ_STREAM: &'static str = "products:dlq";
}

/// One registration request, stored as JSON under the entry's `job` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterProductJob {
    pub id: Uuid,
    pub product: NewProduct,
    #[serde(default)]
    pub retry_count: u32,
}

impl RegisterProductJob {
    pub fn new(product: NewProduct) -> Self {
        Self {
            id: Uuid::now_v7(),
            product,
            retry_count: 0,
        }
    }
}

impl StreamJob for RegisterProductJob {
    fn job_id(&self) -> String {
        self.id.to_string()
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
