//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has passed `Validate::validate`.
///
/// Deserialization failures become [`AppError::JsonExtractorRejection`] and
/// rule violations become [`AppError::ValidationError`], so both produce the
/// standard error body with field details.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct RegisterProductInput {
///     #[validate(length(min = 1))]
///     name: String,
/// }
///
/// async fn register(ValidatedJson(input): ValidatedJson<RegisterProductInput>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedJson(data))
    }
}
