//! Products API - gRPC adapter and HTTP query gateway over one shared service

use axum::Router;
use axum_helpers::server::{create_app, create_router, health_router, shutdown_signal};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{ProductService, ProductStore, handlers};
use eyre::WrapErr;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

mod config;
mod grpc;
mod openapi;

use config::Config;

/// Resolves once shutdown is requested or the sender is gone.
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Awaits `server`; a failure flips `shutdown_tx` so the sibling server stops too.
async fn stop_all_on_error<F, E>(
    name: &'static str,
    server: F,
    shutdown_tx: &watch::Sender<bool>,
) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    let result = server.await;
    if let Err(e) = &result {
        error!(server = name, error = %e, "Server failed, shutting down");
        let _ = shutdown_tx.send(true);
    }
    result
}

/// Runs the HTTP and gRPC servers side by side until both have stopped.
async fn serve_all<H, G, HE, GE>(
    shutdown_tx: &watch::Sender<bool>,
    http: H,
    grpc: G,
) -> eyre::Result<()>
where
    H: Future<Output = Result<(), HE>>,
    G: Future<Output = Result<(), GE>>,
    HE: std::error::Error + Send + Sync + 'static,
    GE: std::error::Error + Send + Sync + 'static,
{
    let (http_result, grpc_result) = tokio::join!(
        stop_all_on_error("http", http, shutdown_tx),
        stop_all_on_error("grpc", grpc, shutdown_tx),
    );
    grpc_result.wrap_err("gRPC server error")?;
    http_result.wrap_err("HTTP server error")?;
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    init_tracing(&config.environment);

    let store = Arc::new(
        ProductStore::from_config(&config.storage)
            .await
            .wrap_err("Failed to initialise product storage")?,
    );
    let service = ProductService::from_shared(Arc::clone(&store));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    tokio::spawn({
        let shutdown_tx = Arc::clone(&shutdown_tx);
        async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        }
    });

    let api_routes = Router::new().nest("/products", handlers::router(service.clone()));
    let router = create_router::<openapi::ApiDoc>(api_routes).merge(health_router(config.app));

    info!(
        http_port = config.server.port,
        grpc_port = config.grpc.port,
        storage = %store.backend(),
        "Starting Products API"
    );

    let served = serve_all(
        &shutdown_tx,
        create_app(router, &config.server, wait_for_shutdown(shutdown_rx.clone())),
        grpc::serve(config.grpc.clone(), service, wait_for_shutdown(shutdown_rx)),
    )
    .await;

    match Arc::try_unwrap(store) {
        Ok(store) => store
            .close()
            .await
            .wrap_err("Failed to close product storage")?,
        Err(_) => warn!("Product storage still referenced at shutdown, skipping close"),
    }

    served?;
    info!("Products API shutdown complete");
    Ok(())
}
