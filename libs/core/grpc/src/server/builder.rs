//! gRPC server startup helpers.

use super::config::ServerConfig;
use tonic_health::ServingStatus;
use tonic_health::server::HealthReporter;
use tracing::info;

/// Startup logging and health reporting shared by every gRPC server.
pub struct GrpcServer;

impl GrpcServer {
    /// Log server startup information for a single service.
    pub fn log_startup(config: &ServerConfig, service_name: &str) {
        Self::log_startup_multiple(config, &[service_name]);
    }

    /// Log server startup information for multiple services.
    pub fn log_startup_multiple(config: &ServerConfig, service_names: &[&str]) {
        info!(
            addr = %config.addr_string(),
            services = ?service_names,
            compression = config.enable_compression,
            max_message_size = config.max_decoding_message_size,
            "gRPC server starting"
        );

        info!("Health check service enabled (grpc.health.v1.Health)");
    }

    /// Mark a single service, and the empty service name, as serving.
    pub async fn setup_health(health_reporter: &HealthReporter, service_name: &str) {
        Self::setup_health_multiple(health_reporter, &[service_name]).await;
    }

    /// Mark all listed services as serving.
    ///
    /// The empty service name is marked too; generic probes query it.
    pub async fn setup_health_multiple(health_reporter: &HealthReporter, service_names: &[&str]) {
        for service_name in service_names {
            health_reporter
                .set_service_status(*service_name, ServingStatus::Serving)
                .await;
        }

        health_reporter
            .set_service_status("", ServingStatus::Serving)
            .await;

        info!(services = ?service_names, "Services marked as serving");
    }

    /// Mark services as not serving, used while draining on shutdown.
    pub async fn mark_not_serving(health_reporter: &HealthReporter, service_names: &[&str]) {
        for service_name in service_names {
            health_reporter
                .set_service_status(*service_name, ServingStatus::NotServing)
                .await;
        }
        health_reporter
            .set_service_status("", ServingStatus::NotServing)
            .await;
    }
}

pub use tonic_health::server::health_reporter as create_health_service;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_startup_does_not_panic() {
        GrpcServer::log_startup(&ServerConfig::default(), "products.v1.ProductsService");
    }

    #[tokio::test]
    async fn test_setup_health_marks_services() {
        let (reporter, _service) = create_health_service();
        GrpcServer::setup_health(&reporter, "products.v1.ProductsService").await;
        GrpcServer::mark_not_serving(&reporter, &["products.v1.ProductsService"]).await;
    }
}
