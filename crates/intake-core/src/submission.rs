//! Server-side acceptance of a completed application.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  draft::ApplicationDraft,
  store::ApplicationStore,
  validate::{ValidationErrors, validate},
};

pub const SUBMITTED_MESSAGE: &str = "Application submitted successfully";

/// Returned to the applicant once the application is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
  pub id:      Uuid,
  pub email:   String,
  pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
  #[error("the application failed validation: {0}")]
  Invalid(ValidationErrors),

  #[error("an application with email {0} already exists")]
  DuplicateEmail(String),

  #[error("store error: {0}")]
  Store(Box<dyn std::error::Error + Send + Sync>),
}

impl SubmitError {
  fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self { Self::Store(Box::new(e)) }
}

/// Re-validate `draft`, check email uniqueness, and insert the application
/// with all of its children atomically.
pub async fn submit_application<S: ApplicationStore>(
  store: &S,
  draft: &ApplicationDraft,
) -> Result<SubmissionReceipt, SubmitError> {
  let new = validate(draft).map_err(SubmitError::Invalid)?;

  if store.email_exists(&new.email).await.map_err(SubmitError::store)? {
    warn!(email = %new.email, "rejected submission with duplicate email");
    return Err(SubmitError::DuplicateEmail(new.email));
  }

  let email = new.email.clone();
  let app = match store.insert_application(new).await {
    Ok(app) => app,
    // Lost the race against a concurrent submission.
    Err(e) if S::is_duplicate_email(&e) => {
      warn!(%email, "duplicate email detected inside the insert transaction");
      return Err(SubmitError::DuplicateEmail(email));
    }
    Err(e) => return Err(SubmitError::store(e)),
  };

  info!(id = %app.id, email = %app.email, "application submitted");
  Ok(SubmissionReceipt { id: app.id, email: app.email, message: SUBMITTED_MESSAGE.to_owned() })
}

/// Optimistic pre-check for the email field. A `true` answer does not
/// guarantee the later insert succeeds.
pub async fn check_email_unique<S: ApplicationStore>(
  store: &S,
  email: &str,
) -> Result<bool, SubmitError> {
  let exists = store.email_exists(email.trim()).await.map_err(SubmitError::store)?;
  Ok(!exists)
}

// ─── Client side ─────────────────────────────────────────────────────────────

/// Why a submission attempt did not produce a receipt, as seen by the
/// wizard.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitFailure {
  /// The server rejected specific fields.
  #[error("the server rejected some fields")]
  Fields(ValidationErrors),

  /// The email is already registered.
  #[error("{0}")]
  Conflict(String),

  /// Anything else: network, server or decoding failure. Safe to retry.
  #[error("{0}")]
  Transport(String),
}

/// Something that can deliver a draft for submission: an HTTP client or an
/// in-process store.
pub trait SubmitApplication {
  fn submit<'a>(
    &'a self,
    draft: &'a ApplicationDraft,
  ) -> impl Future<Output = Result<SubmissionReceipt, SubmitFailure>> + 'a;
}

/// Submits straight into a store, for tests and single-process setups.
pub struct DirectSubmit<'s, S>(pub &'s S);

impl<S: ApplicationStore> SubmitApplication for DirectSubmit<'_, S> {
  fn submit<'a>(
    &'a self,
    draft: &'a ApplicationDraft,
  ) -> impl Future<Output = Result<SubmissionReceipt, SubmitFailure>> + 'a {
    async move {
      submit_application(self.0, draft).await.map_err(|e| match e {
        SubmitError::Invalid(errors) => SubmitFailure::Fields(errors),
        e @ SubmitError::DuplicateEmail(_) => SubmitFailure::Conflict(e.to_string()),
        e @ SubmitError::Store(_) => SubmitFailure::Transport(e.to_string()),
      })
    }
  }
}
