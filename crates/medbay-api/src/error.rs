//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use medbay_core::lifecycle::ValidationError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The submission broke one or more lifecycle rules.
  #[error("{} validation error(s)", .0.len())]
  Validation(Vec<ValidationError>),

  #[error("codec error: {0}")]
  Codec(#[from] medbay_jsonl::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a backend error. Details go to the log only.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    tracing::error!(error = %e, "storage failure");
    ApiError::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"medbay\""),
        );
        return res;
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Validation(errors) => {
        let violations: Vec<String> = errors.iter().map(ToString::to_string).collect();
        (
          StatusCode::UNPROCESSABLE_ENTITY,
          json!({ "error": self.to_string(), "violations": violations }),
        )
      }
      ApiError::Codec(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
      ApiError::Store(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal storage error" }))
      }
    };
    (status, Json(body)).into_response()
  }
}
