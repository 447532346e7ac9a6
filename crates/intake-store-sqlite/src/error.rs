//! Error type for `intake-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] intake_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value the domain types do not know.
  #[error("cannot decode column {column}: {value:?}")]
  Decode { column: &'static str, value: String },

  #[error("application not found: {0}")]
  ApplicationNotFound(uuid::Uuid),

  #[error("an application with email {0} already exists")]
  DuplicateEmail(String),

  /// Every freshly minted public token collided with an existing one.
  #[error("could not mint a unique public token after {0} attempts")]
  TokenExhausted(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
