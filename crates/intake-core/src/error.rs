//! Error types for `intake-core`.

use thiserror::Error;

/// Errors raised while editing a draft. Validation failures are *not* errors;
/// they are reported through [`crate::validate::ValidationErrors`].
#[derive(Debug, Error)]
pub enum DraftError {
  #[error("unknown field: {0}")]
  UnknownField(String),

  #[error("no row at {list}[{index}]")]
  NoSuchRow { list: String, index: usize },

  #[error("the English entry cannot be removed or renamed")]
  EnglishLocked,

  #[error("invalid value for {field}: {reason}")]
  InvalidValue { field: String, reason: String },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("draft error: {0}")]
  Draft(#[from] DraftError),

  #[error("step out of range: {0}")]
  StepOutOfRange(u8),

  #[error("unknown {kind}: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("draft storage error: {0}")]
  Storage(String),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
