//! Configuration for the products worker

use core_config::{AppInfo, ConfigError, Environment, FromEnv, app_info};
use database::redis::RedisConfig;
use domain_products::{ProductStream, StorageConfig};
use stream_worker::WorkerConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub redis: RedisConfig,
    pub storage: StorageConfig,
    pub worker: WorkerConfig,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            redis: RedisConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            worker: WorkerConfig::from_env::<ProductStream>()?,
        })
    }
}
