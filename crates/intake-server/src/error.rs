//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  extract::multipart::MultipartError,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("{0}")]
  BadRequest(String),
  #[error("malformed upload: {0}")]
  Multipart(#[from] MultipartError),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      Error::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"intake\""),
        );
        return res;
      }
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
      // 413 when the body limit was hit, 400 for other framing errors.
      Error::Multipart(e) => (e.status(), e.body_text()),
      Error::Io(e) => {
        error!(error = %e, "upload storage failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to upload file".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
