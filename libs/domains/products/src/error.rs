use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::DatabaseError;
use thiserror::Error;

use crate::models::ProductId;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Product {0} not found")]
    NotFound(ProductId),

    #[error("Capacity of {capacity} products exceeded")]
    CapacityExceeded { capacity: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProductError::NotFound(_))
    }

    /// Only backend failures may succeed when tried again.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProductError::Storage(_))
    }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => AppError::NotFound(format!("Product {} not found", id)),
            err @ ProductError::CapacityExceeded { .. } => AppError::Conflict(err.to_string()),
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            err @ (ProductError::InvalidConfiguration(_) | ProductError::Storage(_)) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for ProductError {
    fn from(err: sea_orm::DbErr) -> Self {
        ProductError::Storage(err.to_string())
    }
}

impl From<DatabaseError> for ProductError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigError(msg) => ProductError::InvalidConfiguration(msg),
            other => ProductError::Storage(other.to_string()),
        }
    }
}
