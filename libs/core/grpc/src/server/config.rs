//! Server configuration loaded from environment variables.

use crate::error::{GrpcError, GrpcResult};
use core_config::{ConfigError, FromEnv, env_flag, env_or_default, env_parse};
use std::net::SocketAddr;
use tonic::codec::CompressionEncoding;

const DEFAULT_HOST: &str = "[::1]";
const DEFAULT_PORT: u16 = 50051;
const DEFAULT_MAX_MESSAGE_SIZE: usize = 8 * 1024 * 1024;

/// Configuration for the gRPC server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to (default: [::1])
    pub host: String,
    /// Port to listen on (default: 50051)
    pub port: u16,
    /// Accept and send zstd-compressed messages (default: true)
    pub enable_compression: bool,
    /// Maximum message size for decoding (default: 8MB)
    pub max_decoding_message_size: usize,
    /// Maximum message size for encoding (default: 8MB)
    pub max_encoding_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            enable_compression: true,
            max_decoding_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_encoding_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl FromEnv for ServerConfig {
    /// Reads:
    /// - `GRPC_HOST` (default: [::1])
    /// - `GRPC_PORT` (default: 50051)
    /// - `GRPC_COMPRESSION` (default: true)
    /// - `GRPC_MAX_MESSAGE_SIZE` (default: 8388608 / 8MB)
    fn from_env() -> Result<Self, ConfigError> {
        let max_message_size: usize =
            env_parse("GRPC_MAX_MESSAGE_SIZE", &DEFAULT_MAX_MESSAGE_SIZE.to_string())?;

        Ok(Self {
            host: env_or_default("GRPC_HOST", DEFAULT_HOST),
            port: env_parse("GRPC_PORT", &DEFAULT_PORT.to_string())?,
            enable_compression: env_flag("GRPC_COMPRESSION", true)?,
            max_decoding_message_size: max_message_size,
            max_encoding_message_size: max_message_size,
        })
    }
}

impl ServerConfig {
    /// Create a new server config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host to bind to.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port to listen on.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable compression.
    pub fn with_compression(mut self, enable: bool) -> Self {
        self.enable_compression = enable;
        self
    }

    /// Set maximum message size in both directions.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_decoding_message_size = size;
        self.max_encoding_message_size = size;
        self
    }

    /// Encoding to advertise, if compression is enabled.
    pub fn compression_encoding(&self) -> Option<CompressionEncoding> {
        self.enable_compression.then_some(CompressionEncoding::Zstd)
    }

    /// Socket address to bind to.
    pub fn socket_addr(&self) -> GrpcResult<SocketAddr> {
        let addr = self.addr_string();
        addr.parse()
            .map_err(|source| GrpcError::InvalidAddress { addr, source })
    }

    /// Address string (for logging).
    pub fn addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
