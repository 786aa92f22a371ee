//! Configuration for Products API

use core_config::{AppInfo, ConfigError, FromEnv, app_info, server::ServerConfig};
use domain_products::StorageConfig;
use grpc_client::ServerConfig as GrpcServerConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub grpc: GrpcServerConfig,
    pub storage: StorageConfig,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            grpc: GrpcServerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        })
    }
}
