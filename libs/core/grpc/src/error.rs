use thiserror::Error;

pub type GrpcResult<T> = Result<T, GrpcError>;

/// Errors raised while configuring or running a gRPC server.
#[derive(Error, Debug)]
pub enum GrpcError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Host/port did not form a socket address
    #[error("Invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Server failed to bind or terminated with an error
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl From<core_config::ConfigError> for GrpcError {
    fn from(err: core_config::ConfigError) -> Self {
        GrpcError::InvalidConfig(err.to_string())
    }
}

/// Extension trait for `Result<T, String>` to produce a [`tonic::Status`].
///
/// ```ignore
/// use grpc_client::ToTonicResult;
///
/// fn require_id(id: &str) -> Result<&str, String> {
///     if id.is_empty() { Err("id is required".to_string()) } else { Ok(id) }
/// }
///
/// let id = require_id(&request.id).to_tonic()?;
/// ```
pub trait ToTonicResult<T> {
    /// Convert the error to a status with INVALID_ARGUMENT code
    fn to_tonic(self) -> Result<T, tonic::Status>;
}

impl<T> ToTonicResult<T> for Result<T, String> {
    fn to_tonic(self) -> Result<T, tonic::Status> {
        self.map_err(tonic::Status::invalid_argument)
    }
}

/// Extension trait turning `None` into a [`tonic::Status`].
pub trait ToTonicOption<T> {
    /// Convert None to a status with INVALID_ARGUMENT code
    fn ok_or_invalid(self, message: impl Into<String>) -> Result<T, tonic::Status>;
}

impl<T> ToTonicOption<T> for Option<T> {
    fn ok_or_invalid(self, message: impl Into<String>) -> Result<T, tonic::Status> {
        self.ok_or_else(|| tonic::Status::invalid_argument(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_tonic_is_invalid_argument() {
        let result: Result<(), String> = Err("id is required".to_string());
        let status = result.to_tonic().unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(status.message(), "id is required");
    }

    #[test]
    fn test_missing_option_is_invalid_argument() {
        let status = None::<u8>.ok_or_invalid("product is required").unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(status.message(), "product is required");
        assert_eq!(Some(3).ok_or_invalid("unused").unwrap(), 3);
    }

    #[test]
    fn test_config_error_becomes_invalid_config() {
        let err: GrpcError = core_config::ConfigError::MissingEnvVar("GRPC_PORT".to_string()).into();
        assert!(matches!(err, GrpcError::InvalidConfig(ref msg) if msg.contains("GRPC_PORT")));
    }
}
