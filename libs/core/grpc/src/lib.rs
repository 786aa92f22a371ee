//! # gRPC server helpers
//!
//! Shared plumbing for the tonic servers in the workspace: environment
//! driven [`ServerConfig`], standard health reporting, and extension traits
//! that turn plain errors into [`tonic::Status`].
//!
//! ```ignore
//! use grpc_client::server::{GrpcServer, ServerConfig, create_health_service};
//! use rpc::products::products_service_server::{ProductsServiceServer, SERVICE_NAME};
//!
//! let config = ServerConfig::from_env()?;
//! let (health_reporter, health_service) = create_health_service();
//! GrpcServer::setup_health(&health_reporter, SERVICE_NAME).await;
//! GrpcServer::log_startup(&config, SERVICE_NAME);
//!
//! tonic::transport::Server::builder()
//!     .add_service(health_service)
//!     .add_service(
//!         ProductsServiceServer::new(my_impl)
//!             .max_decoding_message_size(config.max_decoding_message_size)
//!             .max_encoding_message_size(config.max_encoding_message_size),
//!     )
//!     .serve(config.socket_addr()?)
//!     .await?;
//! ```

pub mod error;
pub mod server;

pub use error::{GrpcError, GrpcResult, ToTonicOption, ToTonicResult};
pub use server::{GrpcServer, ServerConfig, create_health_service};
