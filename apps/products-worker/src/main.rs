//! Products Worker - Entry Point

#[tokio::main]
async fn main() -> eyre::Result<()> {
    core_config::tracing::install_color_eyre();
    products_worker::run().await
}
