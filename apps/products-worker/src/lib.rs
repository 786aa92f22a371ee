//! Products Worker
//!
//! Consumes register-product jobs from a Redis stream and hands them to the
//! products service.
//!
//! ```text
//! Redis Stream (products:register)
//!   ↓ (Consumer Group: products_workers)
//! StreamWorker<RegisterProductJob, RegisterProductProcessor>
//!   ↓
//! ProductService<ProductStore>
//!   ↓ failures
//! products:dlq
//! ```
//!
//! Entries are acknowledged only after the product is registered, the job
//! has been re-enqueued for a retry, or it has been written to the DLQ.

pub mod config;
pub mod processor;

use axum_helpers::shutdown_signal;
use core_config::FromEnv;
use core_config::tracing::init_tracing;
use domain_products::{ProductService, ProductStore, RegisterProductJob};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use stream_worker::StreamWorker;
use tokio::sync::watch;
use tracing::{info, warn};

use config::Config;
use processor::RegisterProductProcessor;

/// Run the worker until SIGINT/SIGTERM.
pub async fn run() -> Result<()> {
    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    init_tracing(&config.environment);

    info!(name = %config.app.name, version = %config.app.version, "Starting products worker");

    let store = Arc::new(
        ProductStore::from_config(&config.storage)
            .await
            .wrap_err("Failed to initialise product storage")?,
    );

    info!("Connecting to Redis...");
    let redis = database::redis::connect_from_config_with_retry(&config.redis, None)
        .await
        .wrap_err("Failed to connect to Redis")?;

    info!(
        stream = %config.worker.stream_name,
        consumer_group = %config.worker.consumer_group,
        consumer_id = %config.worker.consumer_id,
        batch_size = config.worker.batch_size,
        max_retries = config.worker.max_retries,
        "Worker configuration loaded"
    );

    let processor = RegisterProductProcessor::new(ProductService::from_shared(Arc::clone(&store)));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let worker = StreamWorker::<RegisterProductJob, _>::new(redis, processor, config.worker);
    let run_result = worker.run(shutdown_rx).await;
    drop(worker);

    match Arc::try_unwrap(store) {
        Ok(store) => store
            .close()
            .await
            .wrap_err("Failed to close product storage")?,
        Err(_) => warn!("Product storage still referenced at shutdown, skipping close"),
    }

    run_result.wrap_err("Stream worker failed")?;

    info!("Products worker stopped");
    Ok(())
}
