//! `POST /export`: render filtered applications as CSV or JSON.
//!
//! Body: `{"format":"csv","filterStatus":"active","filterCategory":"..."}`.
//! Every field is optional; the format defaults to CSV.

use axum::{Extension, Json, extract::State};
use intake_core::{
  export::{ExportFormat, ExportPayload, render},
  store::{ApplicationStore, ExportFilter},
};
use serde::Deserialize;
use tracing::info;

use crate::{AppState, StaffUser, error::ApiError};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportRequest {
  pub format: ExportFormat,
  #[serde(flatten)]
  pub filter: ExportFilter,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Extension(staff): Extension<StaffUser>,
  Json(req): Json<ExportRequest>,
) -> Result<Json<ExportPayload>, ApiError>
where
  S: ApplicationStore,
{
  let details = state
    .store
    .export_applications(&req.filter)
    .await
    .map_err(ApiError::store)?;
  let payload = render(req.format, &details).map_err(ApiError::store)?;
  info!(staff = %staff.0, format = ?req.format, rows = details.len(), "export rendered");
  Ok(Json(payload))
}
