//! Enqueue a register-product job on the products stream.
//!
//! ```text
//! publish_product --name "Iphone 12" --price 4500
//! ```

use clap::Parser;
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use database::redis::RedisConfig;
use domain_products::{NewProduct, ProductStream, RegisterProductJob};
use eyre::WrapErr;
use stream_worker::StreamProducer;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "publish_product", about = "Publish a product registration to the products stream")]
struct Args {
    /// Product name
    #[arg(long)]
    name: String,

    /// Product description
    #[arg(long, default_value = "")]
    description: String,

    /// Unit-less, non-negative price
    #[arg(long)]
    price: u64,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,
}

impl Args {
    fn job(&self) -> RegisterProductJob {
        RegisterProductJob::new(NewProduct::new(&self.name, &self.description, self.price))
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();
    let args = Args::parse();
    init_tracing(&Environment::from_env());

    let redis_config = match &args.redis_url {
        Some(url) => RedisConfig::new(url),
        None => RedisConfig::from_env()?,
    };
    let redis = database::redis::connect_from_config_with_retry(&redis_config, None)
        .await
        .wrap_err("Failed to connect to Redis")?;

    let producer = StreamProducer::from_stream_def::<ProductStream>(redis);
    let job = args.job();
    let entry_id = producer
        .send(&job)
        .await
        .wrap_err("Failed to publish product")?;

    info!(
        job_id = %job.id,
        stream = producer.stream_name(),
        entry_id = %entry_id,
        "Published product registration"
    );
    Ok(())
}
