//! Request body extraction with envelope-shaped rejections.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::Form;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// Request body accepted as JSON or as a urlencoded form.
///
/// An empty body yields `T::default()` so handlers report their own
/// missing-field errors. Malformed bodies are rejected as `BadRequest`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state).await.map_err(|rejection| {
                debug!(error = %rejection.body_text(), "Rejected form body");
                ApiError::bad_request("Invalid form body")
            })?;
            return Ok(JsonBody(value));
        }

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge
            } else {
                ApiError::bad_request("Invalid request body")
            }
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }

        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            debug!(error = %e, "Rejected JSON body");
            ApiError::bad_request("Invalid JSON body")
        })
    }
}
