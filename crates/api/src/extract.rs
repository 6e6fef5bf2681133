//! Request extractors that fail with enveloped errors.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use botmox_core::error::CoreError;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body extractor whose rejection is a 400 `VALIDATION_ERROR`
/// envelope instead of axum's plain-text default.
///
/// Schema validation happens here, before any handler logic runs; a
/// malformed body never reaches a repository.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(AppError::Core(CoreError::Validation(reject_message(
                &rejection,
            )))),
        }
    }
}

/// Human-readable message for a JSON rejection, without echoing body bytes.
fn reject_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with Content-Type: application/json".to_string()
        }
        other => other.body_text(),
    }
}
