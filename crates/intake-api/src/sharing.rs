//! Public-link handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/applications/:id/public` | Staff; body `{"isPublic": bool}`; returns [`Visibility`] |
//! | `GET`  | `/public/:token` | Unauthenticated read-only detail; 404 unless the token is live |

use axum::{
  Extension, Json,
  extract::{Path, State},
};
use intake_core::{
  application::ApplicationDetail,
  sharing::{PublicToken, Visibility},
  store::ApplicationStore,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, StaffUser, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPublicBody {
  pub is_public: bool,
}

/// `POST /applications/:id/public`
pub async fn set_public<S>(
  State(state): State<AppState<S>>,
  Extension(staff): Extension<StaffUser>,
  Path(id): Path<Uuid>,
  Json(body): Json<SetPublicBody>,
) -> Result<Json<Visibility>, ApiError>
where
  S: ApplicationStore,
{
  let visibility = state
    .store
    .set_public(id, body.is_public)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("application {id} not found")))?;
  info!(%id, staff = %staff.0, is_public = body.is_public, "visibility changed");
  Ok(Json(visibility.with_base_url(&state.public_base_url)))
}

/// `GET /public/:token`
///
/// An unknown token and a token whose application is no longer public give
/// the same response.
pub async fn public_view<S>(
  State(state): State<AppState<S>>,
  Path(token): Path<String>,
) -> Result<Json<ApplicationDetail>, ApiError>
where
  S: ApplicationStore,
{
  let token = PublicToken::new(token);
  let detail = state
    .store
    .get_public(&token)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("application not found".to_owned()))?;
  Ok(Json(detail))
}
