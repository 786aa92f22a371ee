//! Stream processor that registers products.

use async_trait::async_trait;
use domain_products::{ProductError, ProductRepository, ProductService, RegisterProductJob};
use stream_worker::{StreamError, StreamProcessor};
use tracing::info;

/// Calls `ProductService::register_product` for every job.
///
/// Storage failures are reported as transient so the worker retries them;
/// every other error is permanent and sends the job to the DLQ.
pub struct RegisterProductProcessor<R: ProductRepository> {
    service: ProductService<R>,
}

impl<R: ProductRepository> RegisterProductProcessor<R> {
    pub fn new(service: ProductService<R>) -> Self {
        Self { service }
    }
}

fn to_stream_error(err: ProductError) -> StreamError {
    if err.is_transient() {
        StreamError::transient(err.to_string())
    } else {
        StreamError::permanent(err.to_string())
    }
}

#[async_trait]
impl<R: ProductRepository + 'static> StreamProcessor<RegisterProductJob>
    for RegisterProductProcessor<R>
{
    async fn process(&self, job: &RegisterProductJob) -> Result<(), StreamError> {
        let product = self
            .service
            .register_product(job.product.clone())
            .await
            .map_err(to_stream_error)?;

        info!(
            job_id = %job.id,
            product_id = %product.id,
            retry_count = job.retry_count,
            "Registered product from stream"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "register_product"
    }
}
