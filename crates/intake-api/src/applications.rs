//! Handlers for the staff application listing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/applications` | Query: [`ApplicationQuery`] in camelCase; 400 on an out-of-range `limit` |
//! | `GET`  | `/applications/:id` | Full detail; 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use intake_core::{
  application::ApplicationDetail,
  store::{ApplicationPage, ApplicationQuery, ApplicationStore},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /applications[?searchValue=..&limit=..&filterMinSkills=true..]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(query): Query<ApplicationQuery>,
) -> Result<Json<ApplicationPage>, ApiError>
where
  S: ApplicationStore,
{
  query.validate()?;
  let page = state.store.list_applications(&query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

/// `GET /applications/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ApplicationDetail>, ApiError>
where
  S: ApplicationStore,
{
  let detail = state
    .store
    .get_application(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("application {id} not found")))?;
  Ok(Json(detail))
}
