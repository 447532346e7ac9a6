//! Handlers for applicant-facing submission endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/applications` | Body: the full draft; 201 + receipt, 409 on duplicate email, 422 with `fieldErrors` |
//! | `GET`  | `/applications/email-available` | `?email=`; `{"isUnique": bool}` |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use intake_core::{
  draft::ApplicationDraft,
  store::ApplicationStore,
  submission::{check_email_unique, submit_application},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Submit ──────────────────────────────────────────────────────────────────

/// `POST /applications`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Json(draft): Json<ApplicationDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApplicationStore,
{
  let receipt = submit_application(state.store.as_ref(), &draft).await?;
  Ok((StatusCode::CREATED, Json(receipt)))
}

// ─── Email availability ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EmailParams {
  pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAvailability {
  pub is_unique: bool,
}

/// `GET /applications/email-available?email=<email>`
pub async fn email_available<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<EmailParams>,
) -> Result<Json<EmailAvailability>, ApiError>
where
  S: ApplicationStore,
{
  if params.email.trim().is_empty() {
    return Err(ApiError::BadRequest("email is required".to_owned()));
  }
  let is_unique = check_email_unique(state.store.as_ref(), &params.email).await?;
  Ok(Json(EmailAvailability { is_unique }))
}
